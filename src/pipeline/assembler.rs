use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::directory::{CandidateRecord, DetailRecord, DirectoryDetail, DirectorySearch};
use crate::error::DiagnosisError;
use crate::mentions::{MentionSearch, MentionStatus};
use crate::submission::Submission;
use crate::telemetry::metrics::{
    DETAIL_FALLBACK_COUNT, DIAGNOSIS_COMPETITORS, DIAGNOSIS_DURATION,
};

use super::report::{DiagnosisReport, MAX_COMPETITORS, merge_primary, normalize_competitors};

/// Turns a validated submission into a [`DiagnosisReport`].
///
/// Directory search is the only required call. Detail enrichment and mention
/// lookup run concurrently once the primary match is known and only ever
/// degrade the report.
pub struct ReportAssembler {
    search: Arc<dyn DirectorySearch>,
    detail: Arc<dyn DirectoryDetail>,
    mentions: Arc<dyn MentionSearch>,
    detail_name_wait: Duration,
}

impl ReportAssembler {
    pub fn new(
        search: Arc<dyn DirectorySearch>,
        detail: Arc<dyn DirectoryDetail>,
        mentions: Arc<dyn MentionSearch>,
        detail_name_wait: Duration,
    ) -> Self {
        Self {
            search,
            detail,
            mentions,
            detail_name_wait,
        }
    }

    #[tracing::instrument(
        name = "pipeline diagnosis",
        skip(self, submission),
        fields(
            diagnosis.primary_id,
            diagnosis.detail_resolved,
            diagnosis.competitors,
            diagnosis.mention_status,
            diagnosis.duration_ms,
        )
    )]
    pub async fn generate(&self, submission: &Submission) -> Result<DiagnosisReport, DiagnosisError> {
        let start = Instant::now();
        let span = tracing::Span::current();

        // Stage 1: resolve the submission in the directory (fatal on failure)
        let candidates = self.search.search(submission).await?;
        let (primary_candidate, runners_up) = candidates
            .split_first()
            .ok_or(DiagnosisError::NoMatchFound)?;
        let competitor_candidates = &runners_up[..runners_up.len().min(MAX_COMPETITORS)];

        span.record("diagnosis.primary_id", primary_candidate.id.as_str());

        // Stage 2: best-effort enrichment
        let (detail, external_insights) = self.enrich(primary_candidate, submission).await;

        span.record("diagnosis.detail_resolved", detail.is_some());
        if detail.is_none() {
            DETAIL_FALLBACK_COUNT.add(1, &[]);
        }

        // Stage 3: merge into the report
        let report = assemble_report(
            primary_candidate,
            competitor_candidates,
            detail.as_ref(),
            external_insights,
            submission,
        );

        let duration = start.elapsed();
        DIAGNOSIS_DURATION.record(duration.as_secs_f64(), &[]);
        DIAGNOSIS_COMPETITORS.record(report.competitors.len() as f64, &[]);

        span.record("diagnosis.competitors", report.competitors.len());
        span.record("diagnosis.mention_status", report.external_insights.label());
        span.record("diagnosis.duration_ms", duration.as_millis() as u64);

        Ok(report)
    }

    /// Waits up to `detail_name_wait` for the detail record so the mention
    /// lookup can use its name. Past that, mentions go out with the search
    /// name while detail keeps running alongside.
    async fn enrich(
        &self,
        candidate: &CandidateRecord,
        submission: &Submission,
    ) -> (Option<DetailRecord>, MentionStatus) {
        let detail_fut = self.detail.fetch_detail(&candidate.id);
        tokio::pin!(detail_fut);

        let early = tokio::time::timeout(self.detail_name_wait, &mut detail_fut).await;
        match early {
            Ok(detail) => {
                let name = mention_name(detail.as_ref(), candidate, submission);
                let mentions = self.mentions.fetch_mentions(&name, &submission.city).await;
                (detail, mentions)
            }
            Err(_) => {
                tracing::debug!(
                    candidate_id = %candidate.id,
                    "Detail still pending, looking up mentions with the search name"
                );
                let name = mention_name(None, candidate, submission);
                tokio::join!(
                    detail_fut,
                    self.mentions.fetch_mentions(&name, &submission.city)
                )
            }
        }
    }
}

fn mention_name(
    detail: Option<&DetailRecord>,
    candidate: &CandidateRecord,
    submission: &Submission,
) -> String {
    detail
        .and_then(|d| d.display_name.clone())
        .or_else(|| candidate.display_name.clone())
        .unwrap_or_else(|| submission.name.clone())
}

#[tracing::instrument(
    name = "pipeline_stage assemble",
    skip_all,
    fields(
        pipeline.stage = "assemble",
        assemble.detail_merged = detail.is_some(),
        assemble.competitors,
    )
)]
fn assemble_report(
    primary_candidate: &CandidateRecord,
    competitor_candidates: &[CandidateRecord],
    detail: Option<&DetailRecord>,
    external_insights: MentionStatus,
    submission: &Submission,
) -> DiagnosisReport {
    let primary = merge_primary(primary_candidate, detail, submission);
    let competitors = normalize_competitors(&primary, competitor_candidates);

    tracing::Span::current().record("assemble.competitors", competitors.len());

    DiagnosisReport {
        generated_at: Utc::now(),
        primary,
        competitors,
        external_insights,
        source_query: submission.directory_query(),
    }
}
