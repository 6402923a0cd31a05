pub mod places;

use serde::Serialize;

use crate::error::DiagnosisError;
use crate::submission::Submission;

pub use places::PlacesClient;

/// Hard cap on candidates kept from one search response.
pub const MAX_CANDIDATES: usize = 5;
/// Hard cap on reviews kept from one detail response.
pub const MAX_REVIEWS: usize = 5;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// One ranked search result. Absent provider fields stay `None` so the report
/// merge can fall back explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: String,
    pub display_name: Option<String>,
    pub address: Option<String>,
    pub primary_category: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub id: String,
    pub display_name: Option<String>,
    pub address: Option<String>,
    pub primary_category: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
    pub opening_hours: Vec<String>,
    pub reviews: Vec<ReviewItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub author: String,
    pub rating: Option<f64>,
    pub relative_time: String,
    pub text: String,
}

#[async_trait::async_trait]
pub trait DirectorySearch: Send + Sync {
    /// Ranked candidates for the submission, best match first, at most
    /// [`MAX_CANDIDATES`]. Never returns an empty list.
    async fn search(&self, submission: &Submission) -> Result<Vec<CandidateRecord>, DiagnosisError>;
}

#[async_trait::async_trait]
pub trait DirectoryDetail: Send + Sync {
    /// Best-effort enrichment. Any failure yields `None`.
    async fn fetch_detail(&self, candidate_id: &str) -> Option<DetailRecord>;
}
