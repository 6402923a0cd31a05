use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::directory::{CandidateRecord, DetailRecord, ReviewItem};
use crate::mentions::MentionStatus;
use crate::submission::Submission;

pub const MAX_COMPETITORS: usize = 3;
pub const UNNAMED_BUSINESS: &str = "Unnamed business";

/// The submitter's own business, merged from the detail and search records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimarySummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub primary_category: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub phone: String,
    pub website: String,
    pub opening_hours: Vec<String>,
    pub reviews: Vec<ReviewItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorEntry {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub primary_category: String,
    /// Competitor rating minus primary rating, one decimal.
    pub rating_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReport {
    pub generated_at: DateTime<Utc>,
    pub primary: PrimarySummary,
    pub competitors: Vec<CompetitorEntry>,
    pub external_insights: MentionStatus,
    pub source_query: String,
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn prefer<T: Clone>(
    detail: Option<&DetailRecord>,
    from_detail: impl Fn(&DetailRecord) -> &Option<T>,
    from_candidate: &Option<T>,
) -> Option<T> {
    detail
        .and_then(|d| from_detail(d).clone())
        .or_else(|| from_candidate.clone())
}

/// Field by field: detail value, then search value, then (name and address
/// only) what the submitter typed.
pub fn merge_primary(
    candidate: &CandidateRecord,
    detail: Option<&DetailRecord>,
    submission: &Submission,
) -> PrimarySummary {
    PrimarySummary {
        id: candidate.id.clone(),
        name: prefer(detail, |d| &d.display_name, &candidate.display_name)
            .unwrap_or_else(|| submission.name.clone()),
        address: prefer(detail, |d| &d.address, &candidate.address)
            .unwrap_or_else(|| submission.directory_query()),
        primary_category: prefer(detail, |d| &d.primary_category, &candidate.primary_category)
            .unwrap_or_default(),
        rating: prefer(detail, |d| &d.rating, &candidate.rating),
        review_count: prefer(detail, |d| &d.review_count, &candidate.review_count),
        phone: prefer(detail, |d| &d.phone, &candidate.phone).unwrap_or_default(),
        website: prefer(detail, |d| &d.website_url, &candidate.website_url).unwrap_or_default(),
        opening_hours: detail.map(|d| d.opening_hours.clone()).unwrap_or_default(),
        reviews: detail.map(|d| d.reviews.clone()).unwrap_or_default(),
    }
}

/// Ranks runner-up candidates 1..=3, dropping any that repeat the primary id.
pub fn normalize_competitors(
    primary: &PrimarySummary,
    candidates: &[CandidateRecord],
) -> Vec<CompetitorEntry> {
    candidates
        .iter()
        .filter(|c| c.id != primary.id)
        .take(MAX_COMPETITORS)
        .enumerate()
        .map(|(index, c)| CompetitorEntry {
            rank: index + 1,
            id: c.id.clone(),
            name: c
                .display_name
                .clone()
                .unwrap_or_else(|| UNNAMED_BUSINESS.to_string()),
            address: c.address.clone().unwrap_or_default(),
            rating: c.rating,
            review_count: c.review_count,
            primary_category: c.primary_category.clone().unwrap_or_default(),
            rating_delta: match (c.rating, primary.rating) {
                (Some(theirs), Some(ours)) => Some(round_one_decimal(theirs - ours)),
                _ => None,
            },
        })
        .collect()
}
