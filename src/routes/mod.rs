pub mod diagnosis;
pub mod health;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/diagnosis", post(diagnosis::create_diagnosis))
}
