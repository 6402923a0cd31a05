pub mod config;
pub mod directory;
pub mod error;
pub mod mentions;
pub mod notify;
pub mod pipeline;
pub mod routes;
pub mod submission;
pub mod telemetry;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use config::Config;

use directory::PlacesClient;
use mentions::ScraperClient;
use notify::{Notifier, WebhookNotifier};
use pipeline::ReportAssembler;

/// Outbound HTTP client shared by the provider clients. Idle connections are
/// dropped after each request so no pool outlives the submission that used it.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub assembler: Arc<ReportAssembler>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Wires the production providers. Credentials go straight into each
    /// client; a missing one degrades that client instead of failing here.
    pub fn from_config(config: Config) -> Self {
        let places = Arc::new(PlacesClient::new(&config));
        let assembler = ReportAssembler::new(
            places.clone(),
            places,
            Arc::new(ScraperClient::new(&config)),
            config.detail_name_wait(),
        );

        Self {
            assembler: Arc::new(assembler),
            notifier: Arc::new(WebhookNotifier::new(&config)),
            config,
        }
    }
}
