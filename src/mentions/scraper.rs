use opentelemetry::KeyValue;
use serde::Deserialize;

use super::{MAX_MENTIONS, MentionItem, MentionSearch, MentionStatus};
use crate::config::Config;
use crate::submission::join_non_empty;
use crate::telemetry::metrics::{MENTION_STATUS_COUNT, UPSTREAM_ERROR_COUNT};

/// Number of organic results requested from the aggregator.
const REQUESTED_RESULTS: &str = "5";

/// Structured Google search through the ScraperAPI aggregator.
pub struct ScraperClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    language: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    organic_results: Option<Vec<OrganicResult>>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
    source: Option<String>,
}

impl From<OrganicResult> for MentionItem {
    fn from(r: OrganicResult) -> Self {
        MentionItem {
            title: r.title.unwrap_or_default(),
            snippet: r.snippet.unwrap_or_default(),
            link: r.link.unwrap_or_default(),
            source: r.source.unwrap_or_default(),
        }
    }
}

impl ScraperClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: crate::http_client(),
            api_key: config.scraper_api_key.clone(),
            base_url: config.scraper_base_url.clone(),
            language: config.scraper_language.clone(),
        }
    }

    async fn search(&self, api_key: &str, query: &str) -> anyhow::Result<Vec<MentionItem>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", api_key),
                ("q", query),
                ("num", REQUESTED_RESULTS),
                ("hl", self.language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("HTTP {}: {}", status.as_u16(), error_body));
        }

        let payload: SearchResponse = response.json().await?;

        Ok(payload
            .organic_results
            .unwrap_or_default()
            .into_iter()
            .take(MAX_MENTIONS)
            .map(MentionItem::from)
            .collect())
    }

    #[tracing::instrument(
        name = "pipeline_stage mentions",
        skip(self),
        fields(
            pipeline.stage = "mentions",
            mentions.status,
            mentions.items,
        )
    )]
    pub async fn lookup(&self, business_name: &str, city: &str) -> MentionStatus {
        let status = match self.api_key.as_deref() {
            None => MentionStatus::Disabled,
            Some(api_key) => {
                let query = join_non_empty(&[business_name, city]);
                if query.is_empty() {
                    MentionStatus::Empty
                } else {
                    match self.search(api_key, &query).await {
                        Ok(items) => MentionStatus::from_items(items),
                        Err(err) => {
                            UPSTREAM_ERROR_COUNT.add(
                                1,
                                &[
                                    KeyValue::new("upstream.provider", "scraper"),
                                    KeyValue::new("upstream.operation", "mentions"),
                                    KeyValue::new("error.type", "failed"),
                                ],
                            );
                            tracing::warn!(error = %err, "External mention lookup failed");
                            MentionStatus::Error {
                                message: err.to_string(),
                            }
                        }
                    }
                }
            }
        };

        let span = tracing::Span::current();
        span.record("mentions.status", status.label());
        span.record("mentions.items", status.items().len());
        MENTION_STATUS_COUNT.add(1, &[KeyValue::new("mentions.status", status.label())]);

        status
    }
}

#[async_trait::async_trait]
impl MentionSearch for ScraperClient {
    async fn fetch_mentions(&self, business_name: &str, city: &str) -> MentionStatus {
        self.lookup(business_name, city).await
    }
}
