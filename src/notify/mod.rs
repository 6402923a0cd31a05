pub mod webhook;

use serde::Serialize;

use crate::submission::Submission;

pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub attempted: bool,
    pub delivered: bool,
}

/// Best-effort push of a submission to the messaging workflow.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// True only when the workflow acknowledged with a 2xx. Never errors.
    async fn notify(&self, submission: &Submission, recipient: &str) -> bool;
}

/// Blank or absent recipients are never attempted.
pub async fn dispatch(
    notifier: &dyn Notifier,
    submission: &Submission,
    recipient: Option<&str>,
) -> NotificationOutcome {
    match recipient.map(str::trim).filter(|r| !r.is_empty()) {
        Some(recipient) => NotificationOutcome {
            attempted: true,
            delivered: notifier.notify(submission, recipient).await,
        },
        None => NotificationOutcome::default(),
    }
}
