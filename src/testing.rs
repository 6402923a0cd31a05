//! In-memory stand-ins for the upstream providers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::directory::{CandidateRecord, DetailRecord, DirectoryDetail, DirectorySearch};
use crate::error::DiagnosisError;
use crate::mentions::{MentionSearch, MentionStatus};
use crate::notify::Notifier;
use crate::submission::Submission;

pub fn candidate(
    id: &str,
    name: Option<&str>,
    rating: Option<f64>,
    review_count: Option<u32>,
) -> CandidateRecord {
    CandidateRecord {
        id: id.to_string(),
        display_name: name.map(str::to_string),
        rating,
        review_count,
        ..Default::default()
    }
}

pub struct FakeSearch {
    result: Result<Vec<CandidateRecord>, DiagnosisError>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn returning(result: Result<Vec<CandidateRecord>, DiagnosisError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DirectorySearch for FakeSearch {
    async fn search(&self, _submission: &Submission) -> Result<Vec<CandidateRecord>, DiagnosisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub struct FakeDetail {
    detail: Option<DetailRecord>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeDetail {
    pub fn returning(detail: Option<DetailRecord>) -> Self {
        Self {
            detail,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(detail: Option<DetailRecord>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::returning(detail)
        }
    }
}

#[async_trait::async_trait]
impl DirectoryDetail for FakeDetail {
    async fn fetch_detail(&self, _candidate_id: &str) -> Option<DetailRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.detail.clone()
    }
}

pub struct FakeMentions {
    status: MentionStatus,
    /// (business name, city) pairs seen, in call order.
    pub queries: Mutex<Vec<(String, String)>>,
}

impl FakeMentions {
    pub fn returning(status: MentionStatus) -> Self {
        Self {
            status,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queried_names(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl MentionSearch for FakeMentions {
    async fn fetch_mentions(&self, business_name: &str, city: &str) -> MentionStatus {
        self.queries
            .lock()
            .unwrap()
            .push((business_name.to_string(), city.to_string()));
        self.status.clone()
    }
}

pub struct FakeNotifier {
    delivered: bool,
    pub calls: AtomicUsize,
}

impl FakeNotifier {
    pub fn returning(delivered: bool) -> Self {
        Self {
            delivered,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, _submission: &Submission, _recipient: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.delivered
    }
}
