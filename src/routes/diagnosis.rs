use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::notify::NotificationOutcome;
use crate::pipeline::{DiagnosisReport, handle_submission};
use crate::submission::{RawSubmission, Submission, validate};

const CALL_TO_ACTION: &str = "Next step: authorize your Google business account to get the 60-day in-depth diagnosis and rating improvement plan.";

#[derive(Debug, Deserialize)]
pub struct DiagnosisBody {
    #[serde(flatten)]
    pub fields: RawSubmission,
    /// Messaging user the workflow should push the report to.
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub call_to_action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_report_url: Option<String>,
}

impl NextSteps {
    fn from_config(config: &Config) -> Self {
        Self {
            call_to_action: CALL_TO_ACTION,
            authorization_url: config.authorization_url.clone(),
            sample_report_url: config.sample_report_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub submission: Submission,
    pub message: String,
    pub hook: String,
    pub notification: NotificationOutcome,
    pub report: DiagnosisReport,
    pub next_steps: NextSteps,
}

pub async fn create_diagnosis(
    State(state): State<AppState>,
    Json(body): Json<DiagnosisBody>,
) -> AppResult<Response> {
    let submission = validate(&body.fields)?;

    let outcome = handle_submission(
        &state.assembler,
        state.notifier.as_ref(),
        &submission,
        body.recipient.as_deref(),
    )
    .await;

    let message = outcome.message();
    let notification = outcome.notification;

    match outcome.diagnosis {
        Ok(report) => {
            let hook = crate::pipeline::derive_hook(&report);
            Ok(Json(DiagnosisResponse {
                submission,
                message,
                hook,
                notification,
                report,
                next_steps: NextSteps::from_config(&state.config),
            })
            .into_response())
        }
        Err(err) => {
            let err = AppError::from(err);
            let mut body = err.body();
            body["message"] = json!(message);
            body["notification"] = json!(notification);
            Ok((err.status(), Json(body)).into_response())
        }
    }
}
