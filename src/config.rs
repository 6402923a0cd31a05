use std::env;
use std::time::Duration;

pub const DEFAULT_WEBHOOK_URL: &str = "https://chelov134999.app.n8n.cloud/webhook/lead-entry";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub places_api_key: Option<String>,
    pub places_base_url: String,
    pub places_language_code: String,
    pub places_region_code: String,
    pub places_max_results: u32,
    pub scraper_api_key: Option<String>,
    pub scraper_base_url: String,
    pub scraper_language: String,
    pub webhook_url: String,
    pub detail_name_wait_ms: u64,
    pub authorization_url: Option<String>,
    pub sample_report_url: Option<String>,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("APP_PORT must be a number"),
            environment: env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            places_api_key: non_empty_var("GOOGLE_PLACES_API_KEY"),
            places_base_url: env::var("PLACES_BASE_URL")
                .unwrap_or_else(|_| "https://places.googleapis.com/v1".to_string()),
            places_language_code: env::var("PLACES_LANGUAGE_CODE")
                .unwrap_or_else(|_| "zh-TW".to_string()),
            places_region_code: env::var("PLACES_REGION_CODE")
                .unwrap_or_else(|_| "TW".to_string()),
            places_max_results: env::var("PLACES_MAX_RESULTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("PLACES_MAX_RESULTS must be a number"),
            scraper_api_key: non_empty_var("SCRAPER_API_KEY"),
            scraper_base_url: env::var("SCRAPER_BASE_URL").unwrap_or_else(|_| {
                "https://api.scraperapi.com/structured/google/search".to_string()
            }),
            scraper_language: env::var("SCRAPER_LANGUAGE").unwrap_or_else(|_| "zh-tw".to_string()),
            webhook_url: env::var("WEBHOOK_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string()),
            detail_name_wait_ms: env::var("DETAIL_NAME_WAIT_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("DETAIL_NAME_WAIT_MS must be a number"),
            authorization_url: non_empty_var("AUTHORIZATION_URL"),
            sample_report_url: non_empty_var("SAMPLE_REPORT_URL"),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "store-diagnosis".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn detail_name_wait(&self) -> Duration {
        Duration::from_millis(self.detail_name_wait_ms)
    }

    /// Names of the provider credentials that are not configured.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.places_api_key.is_none() {
            missing.push("GOOGLE_PLACES_API_KEY");
        }
        if self.scraper_api_key.is_none() {
            missing.push("SCRAPER_API_KEY");
        }
        missing
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            environment: "test".to_string(),
            places_api_key: Some("places-key".to_string()),
            places_base_url: "http://127.0.0.1:9/v1".to_string(),
            places_language_code: "zh-TW".to_string(),
            places_region_code: "TW".to_string(),
            places_max_results: 5,
            scraper_api_key: Some("scraper-key".to_string()),
            scraper_base_url: "http://127.0.0.1:9/search".to_string(),
            scraper_language: "zh-tw".to_string(),
            webhook_url: "http://127.0.0.1:9/webhook".to_string(),
            detail_name_wait_ms: 1000,
            authorization_url: None,
            sample_report_url: None,
            otel_service_name: "store-diagnosis-test".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_absent_keys() {
        let mut config = Config::for_tests();
        assert!(config.missing_credentials().is_empty());

        config.places_api_key = None;
        config.scraper_api_key = None;
        assert_eq!(
            config.missing_credentials(),
            vec!["GOOGLE_PLACES_API_KEY", "SCRAPER_API_KEY"]
        );
    }

    #[test]
    fn test_is_production() {
        let mut config = Config::for_tests();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_detail_name_wait() {
        let mut config = Config::for_tests();
        config.detail_name_wait_ms = 250;
        assert_eq!(config.detail_name_wait(), Duration::from_millis(250));
    }
}
