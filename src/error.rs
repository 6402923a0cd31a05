use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Failures that abort a diagnosis. Everything else degrades the report instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosisError {
    #[error("Incomplete submission, missing: {}", .missing.join(", "))]
    IncompleteSubmission { missing: Vec<&'static str> },

    #[error("Submission does not contain enough data to build a directory query")]
    InsufficientQueryData,

    #[error("Directory provider credential is not configured")]
    MissingCredential,

    #[error("No matching business found in the directory")]
    NoMatchFound,

    #[error("Directory provider returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Directory provider request failed: {0}")]
    Transport(String),
}

impl DiagnosisError {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosisError::IncompleteSubmission { .. } => "incomplete_submission",
            DiagnosisError::InsufficientQueryData => "insufficient_query_data",
            DiagnosisError::MissingCredential => "missing_credential",
            DiagnosisError::NoMatchFound => "no_match_found",
            DiagnosisError::Upstream { .. } => "upstream_error",
            DiagnosisError::Transport(_) => "transport_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DiagnosisError::IncompleteSubmission { .. } | DiagnosisError::InsufficientQueryData => {
                StatusCode::BAD_REQUEST
            }
            DiagnosisError::NoMatchFound => StatusCode::NOT_FOUND,
            DiagnosisError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
            DiagnosisError::Upstream { .. } | DiagnosisError::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Diagnosis(#[from] DiagnosisError),
}

pub(crate) fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Diagnosis(e) => (e.status_code(), e.code()),
        }
    }

    /// `{error, code, status, trace_id?}`; diagnosis failures extend it with
    /// the notification outcome.
    pub fn body(&self) -> Value {
        let (status, code) = self.status_and_code();
        let error_message = self.to_string();

        let mut body = json!({
            "error": error_message,
            "code": code,
            "status": status.as_u16(),
        });
        if let Some(trace_id) = get_trace_id() {
            body["trace_id"] = Value::String(trace_id);
        }
        body
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Diagnosis(e @ DiagnosisError::IncompleteSubmission { .. }) => {
                tracing::info!(error = %e, "Rejected submission");
            }
            AppError::Diagnosis(e) => {
                tracing::warn!(error = %e, code = e.code(), "Diagnosis failed");
            }
        }

        (self.status(), Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
