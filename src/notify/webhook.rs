use opentelemetry::KeyValue;
use serde::Serialize;
use serde_json::json;

use super::Notifier;
use crate::config::Config;
use crate::submission::Submission;
use crate::telemetry::metrics::NOTIFICATION_COUNT;

/// Posts submissions to the workflow webhook wrapped in a messaging-platform
/// event envelope addressed to the recipient.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookEnvelope<'a> {
    destination: &'a str,
    events: Vec<WebhookEvent<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookEvent<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    message: EventMessage,
    timestamp: i64,
    source: EventSource<'a>,
    reply_token: &'static str,
    mode: &'static str,
}

#[derive(Serialize)]
struct EventMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    user_id: &'a str,
}

fn envelope<'a>(submission: &Submission, recipient: &'a str) -> WebhookEnvelope<'a> {
    let text = json!({
        "action": "form_submit",
        "city": submission.city,
        "route": submission.route,
        "number": submission.number,
        "name": submission.name,
        "submittedAt": submission.submitted_at.to_rfc3339(),
    })
    .to_string();

    WebhookEnvelope {
        destination: recipient,
        events: vec![WebhookEvent {
            event_type: "message",
            message: EventMessage {
                message_type: "text",
                text,
            },
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: EventSource {
                source_type: "user",
                user_id: recipient,
            },
            reply_token: "",
            mode: "active",
        }],
    }
}

impl WebhookNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: crate::http_client(),
            webhook_url: config.webhook_url.clone(),
        }
    }

    async fn post(&self, submission: &Submission, recipient: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&envelope(submission, recipient))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "webhook responded {}: {}",
                status.as_u16(),
                error_body
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    #[tracing::instrument(name = "notification dispatch", skip(self, submission, recipient))]
    async fn notify(&self, submission: &Submission, recipient: &str) -> bool {
        let delivered = match self.post(submission, recipient).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Notification webhook failed");
                false
            }
        };

        NOTIFICATION_COUNT.add(
            1,
            &[KeyValue::new(
                "notification.outcome",
                if delivered { "delivered" } else { "failed" },
            )],
        );

        delivered
    }
}
