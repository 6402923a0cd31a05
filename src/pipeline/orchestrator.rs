use crate::error::DiagnosisError;
use crate::notify::{self, NotificationOutcome, Notifier};
use crate::submission::Submission;

use super::assembler::ReportAssembler;
use super::hook::derive_hook;
use super::report::DiagnosisReport;

/// Both branches of one submission, each settled independently.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub notification: NotificationOutcome,
    pub diagnosis: Result<DiagnosisReport, DiagnosisError>,
}

impl SubmissionOutcome {
    pub fn hook(&self) -> Option<String> {
        self.diagnosis.as_ref().ok().map(derive_hook)
    }

    /// Status line for the submitter, with the hook appended when a report exists.
    pub fn message(&self) -> String {
        match &self.diagnosis {
            Err(err) => format!("Report generation failed: {err}"),
            Ok(report) => {
                let base = if self.notification.delivered {
                    "Submission received; the report will be pushed to your chat, you can close this window."
                } else if self.notification.attempted {
                    "Report generated, but chat delivery could not be confirmed; please copy it back manually."
                } else {
                    "Report generated; the full summary and raw data are below."
                };
                format!("{base} {}", derive_hook(report))
            }
        }
    }
}

/// Starts notification dispatch and report assembly together and waits for
/// both. Neither branch can cancel or fail the other.
#[tracing::instrument(
    name = "submission",
    skip(assembler, notifier, submission, recipient),
    fields(
        submission.name = %submission.name,
        submission.city = %submission.city,
        notification.attempted,
        notification.delivered,
        diagnosis.ok,
    )
)]
pub async fn handle_submission(
    assembler: &ReportAssembler,
    notifier: &dyn Notifier,
    submission: &Submission,
    recipient: Option<&str>,
) -> SubmissionOutcome {
    let (notification, diagnosis) = tokio::join!(
        notify::dispatch(notifier, submission, recipient),
        assembler.generate(submission),
    );

    let span = tracing::Span::current();
    span.record("notification.attempted", notification.attempted);
    span.record("notification.delivered", notification.delivered);
    span.record("diagnosis.ok", diagnosis.is_ok());

    if let Err(err) = &diagnosis {
        tracing::warn!(error = %err, code = err.code(), "Diagnosis report not produced");
    }

    SubmissionOutcome {
        notification,
        diagnosis,
    }
}
