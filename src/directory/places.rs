use opentelemetry::KeyValue;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{
    ANONYMOUS_AUTHOR, CandidateRecord, DetailRecord, DirectoryDetail, DirectorySearch,
    MAX_CANDIDATES, MAX_REVIEWS, ReviewItem,
};
use crate::config::Config;
use crate::error::DiagnosisError;
use crate::submission::Submission;
use crate::telemetry::metrics::{DIRECTORY_CANDIDATES, UPSTREAM_ERROR_COUNT};

const SEARCH_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.primaryTypeDisplayName,places.rating,places.userRatingCount,\
places.internationalPhoneNumber,places.websiteUri";

const DETAIL_FIELD_MASK: &str = "id,displayName,formattedAddress,primaryTypeDisplayName,\
internationalPhoneNumber,regularOpeningHours,websiteUri,rating,userRatingCount,reviews";

/// Google Places (v1) client serving both text search and place details.
pub struct PlacesClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    language_code: String,
    region_code: String,
    max_results: u32,
}

impl PlacesClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: crate::http_client(),
            api_key: config.places_api_key.clone(),
            base_url: config.places_base_url.trim_end_matches('/').to_string(),
            language_code: config.places_language_code.clone(),
            region_code: config.places_region_code.clone(),
            max_results: config.places_max_results.clamp(1, MAX_CANDIDATES as u32),
        }
    }

    fn headers(api_key: &str, field_mask: &'static str) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| anyhow::anyhow!("invalid API key header: {e}"))?,
        );
        headers.insert("x-goog-fieldmask", HeaderValue::from_static(field_mask));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn detail_url(&self, candidate_id: &str) -> String {
        if candidate_id.starts_with("places/") {
            format!("{}/{}", self.base_url, candidate_id)
        } else {
            format!("{}/places/{}", self.base_url, candidate_id)
        }
    }

    #[tracing::instrument(
        name = "pipeline_stage search",
        skip(self, submission),
        fields(
            pipeline.stage = "search",
            directory.query,
            directory.candidates,
        )
    )]
    pub async fn search_text(
        &self,
        submission: &Submission,
    ) -> Result<Vec<CandidateRecord>, DiagnosisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DiagnosisError::MissingCredential)?;

        let query = submission.directory_query();
        if query.is_empty() {
            return Err(DiagnosisError::InsufficientQueryData);
        }

        let span = tracing::Span::current();
        span.record("directory.query", query.as_str());

        let headers = Self::headers(api_key, SEARCH_FIELD_MASK)
            .map_err(|e| DiagnosisError::Transport(e.to_string()))?;

        let body = SearchTextRequest {
            text_query: &query,
            language_code: &self.language_code,
            region_code: &self.region_code,
            max_result_count: self.max_results,
        };

        let response = self
            .client
            .post(format!("{}/places:searchText", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                record_upstream_error("search", "transport");
                DiagnosisError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            record_upstream_error("search", "status");
            return Err(DiagnosisError::Upstream {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let payload: SearchTextResponse = response.json().await.map_err(|e| {
            record_upstream_error("search", "decode");
            DiagnosisError::Transport(format!("invalid search response: {e}"))
        })?;

        let candidates: Vec<CandidateRecord> = payload
            .places
            .unwrap_or_default()
            .into_iter()
            .filter_map(Place::into_candidate)
            .take(MAX_CANDIDATES)
            .collect();

        span.record("directory.candidates", candidates.len());
        DIRECTORY_CANDIDATES.record(candidates.len() as f64, &[]);

        if candidates.is_empty() {
            return Err(DiagnosisError::NoMatchFound);
        }

        Ok(candidates)
    }

    #[tracing::instrument(
        name = "pipeline_stage detail",
        skip(self),
        fields(
            pipeline.stage = "detail",
            detail.reviews,
        )
    )]
    pub async fn place_detail(&self, candidate_id: &str) -> anyhow::Result<DetailRecord> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("places API key is not configured"))?;

        let response = self
            .client
            .get(self.detail_url(candidate_id))
            .query(&[
                ("languageCode", self.language_code.as_str()),
                ("regionCode", self.region_code.as_str()),
            ])
            .headers(Self::headers(api_key, DETAIL_FIELD_MASK)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Places detail error ({}): {}",
                status,
                error_body
            ));
        }

        let place: Place = response.json().await?;
        let detail = place.into_detail(candidate_id);

        tracing::Span::current().record("detail.reviews", detail.reviews.len());

        Ok(detail)
    }
}

#[async_trait::async_trait]
impl DirectorySearch for PlacesClient {
    async fn search(&self, submission: &Submission) -> Result<Vec<CandidateRecord>, DiagnosisError> {
        self.search_text(submission).await
    }
}

#[async_trait::async_trait]
impl DirectoryDetail for PlacesClient {
    async fn fetch_detail(&self, candidate_id: &str) -> Option<DetailRecord> {
        match self.place_detail(candidate_id).await {
            Ok(detail) => Some(detail),
            Err(err) => {
                record_upstream_error("detail", "failed");
                tracing::warn!(
                    candidate_id = %candidate_id,
                    error = %err,
                    "Place detail unavailable, using search record"
                );
                None
            }
        }
    }
}

fn record_upstream_error(operation: &'static str, kind: &'static str) {
    UPSTREAM_ERROR_COUNT.add(
        1,
        &[
            KeyValue::new("upstream.provider", "places"),
            KeyValue::new("upstream.operation", operation),
            KeyValue::new("error.type", kind),
        ],
    );
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    language_code: &'a str,
    region_code: &'a str,
    max_result_count: u32,
}

#[derive(Deserialize)]
struct SearchTextResponse {
    places: Option<Vec<Place>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Place {
    id: Option<String>,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    primary_type_display_name: Option<LocalizedText>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    international_phone_number: Option<String>,
    website_uri: Option<String>,
    regular_opening_hours: Option<OpeningHours>,
    reviews: Option<Vec<PlaceReview>>,
}

#[derive(Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    weekday_descriptions: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceReview {
    author_attribution: Option<AuthorAttribution>,
    rating: Option<f64>,
    relative_publish_time_description: Option<String>,
    original_text: Option<LocalizedText>,
    text: Option<LocalizedText>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorAttribution {
    display_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn localized(value: Option<LocalizedText>) -> Option<String> {
    non_empty(value.and_then(|t| t.text))
}

impl Place {
    fn into_candidate(self) -> Option<CandidateRecord> {
        let id = non_empty(self.id)?;
        Some(CandidateRecord {
            id,
            display_name: localized(self.display_name),
            address: non_empty(self.formatted_address),
            primary_category: localized(self.primary_type_display_name),
            rating: self.rating,
            review_count: self.user_rating_count,
            phone: non_empty(self.international_phone_number),
            website_url: non_empty(self.website_uri),
        })
    }

    fn into_detail(self, requested_id: &str) -> DetailRecord {
        let reviews = self
            .reviews
            .unwrap_or_default()
            .into_iter()
            .take(MAX_REVIEWS)
            .map(PlaceReview::into_item)
            .collect();

        DetailRecord {
            id: non_empty(self.id).unwrap_or_else(|| requested_id.to_string()),
            display_name: localized(self.display_name),
            address: non_empty(self.formatted_address),
            primary_category: localized(self.primary_type_display_name),
            rating: self.rating,
            review_count: self.user_rating_count,
            phone: non_empty(self.international_phone_number),
            website_url: non_empty(self.website_uri),
            opening_hours: self
                .regular_opening_hours
                .and_then(|h| h.weekday_descriptions)
                .unwrap_or_default(),
            reviews,
        }
    }
}

impl PlaceReview {
    fn into_item(self) -> ReviewItem {
        ReviewItem {
            author: non_empty(self.author_attribution.and_then(|a| a.display_name))
                .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
            rating: self.rating,
            relative_time: self.relative_publish_time_description.unwrap_or_default(),
            text: localized(self.original_text)
                .or_else(|| localized(self.text))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::sample_submission;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> PlacesClient {
        let mut config = Config::for_tests();
        config.places_base_url = server.url("/v1");
        PlacesClient::new(&config)
    }

    #[test]
    fn test_place_into_candidate_requires_id() {
        let place: Place = serde_json::from_value(json!({
            "displayName": {"text": "No Id Diner"}
        }))
        .unwrap();
        assert!(place.into_candidate().is_none());
    }

    #[test]
    fn test_review_mapping_fallbacks() {
        let reviews: Vec<PlaceReview> = serde_json::from_value(json!([
            {
                "authorAttribution": {"displayName": "Mei"},
                "rating": 5,
                "relativePublishTimeDescription": "a week ago",
                "originalText": {"text": "original words"},
                "text": {"text": "translated words"}
            },
            {"text": {"text": "only translated"}},
            {"authorAttribution": {"displayName": ""}, "originalText": {"text": ""}}
        ]))
        .unwrap();

        let items: Vec<ReviewItem> = reviews.into_iter().map(PlaceReview::into_item).collect();

        assert_eq!(items[0].author, "Mei");
        assert_eq!(items[0].rating, Some(5.0));
        assert_eq!(items[0].relative_time, "a week ago");
        assert_eq!(items[0].text, "original words");

        assert_eq!(items[1].author, ANONYMOUS_AUTHOR);
        assert_eq!(items[1].text, "only translated");
        assert_eq!(items[1].rating, None);

        assert_eq!(items[2].author, ANONYMOUS_AUTHOR);
        assert_eq!(items[2].text, "");
    }

    #[test]
    fn test_detail_truncates_reviews_and_reads_hours() {
        let reviews: Vec<serde_json::Value> = (0..8)
            .map(|i| json!({"originalText": {"text": format!("review {i}")}}))
            .collect();
        let place: Place = serde_json::from_value(json!({
            "displayName": {"text": "Sunrise Cafe"},
            "regularOpeningHours": {"weekdayDescriptions": ["Monday: 08:00-17:00"]},
            "reviews": reviews
        }))
        .unwrap();

        let detail = place.into_detail("abc");
        assert_eq!(detail.id, "abc");
        assert_eq!(detail.reviews.len(), MAX_REVIEWS);
        assert_eq!(detail.reviews[4].text, "review 4");
        assert_eq!(detail.opening_hours, vec!["Monday: 08:00-17:00"]);
    }

    #[test]
    fn test_detail_url_accepts_resource_names() {
        let client = PlacesClient::new(&Config::for_tests());
        assert_eq!(client.detail_url("abc"), "http://127.0.0.1:9/v1/places/abc");
        assert_eq!(
            client.detail_url("places/abc"),
            "http://127.0.0.1:9/v1/places/abc"
        );
    }

    #[tokio::test]
    async fn test_search_without_key_fails_before_network() {
        let mut config = Config::for_tests();
        config.places_api_key = None;
        let client = PlacesClient::new(&config);

        let mut submission = sample_submission();
        submission.name = String::new();
        submission.city = String::new();
        submission.route = String::new();
        submission.number = String::new();

        // Credential check comes before query construction.
        let result = client.search(&submission).await;
        assert_eq!(result, Err(DiagnosisError::MissingCredential));
    }

    #[tokio::test]
    async fn test_search_with_empty_query_makes_no_call() {
        let client = PlacesClient::new(&Config::for_tests());
        let mut submission = sample_submission();
        submission.name = " ".to_string();
        submission.city = String::new();
        submission.route = String::new();
        submission.number = String::new();

        let result = client.search(&submission).await;
        assert_eq!(result, Err(DiagnosisError::InsufficientQueryData));
    }

    #[tokio::test]
    async fn test_search_sends_query_and_maps_candidates() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/places:searchText")
                    .header("x-goog-api-key", "places-key")
                    .json_body(json!({
                        "textQuery": "Sunrise Cafe Taipei Zhongshan Rd 12",
                        "languageCode": "zh-TW",
                        "regionCode": "TW",
                        "maxResultCount": 5
                    }));
                then.status(200).json_body(json!({
                    "places": [
                        {
                            "id": "p1",
                            "displayName": {"text": "Sunrise Cafe"},
                            "formattedAddress": "12 Zhongshan Rd, Taipei",
                            "primaryTypeDisplayName": {"text": "Cafe"},
                            "rating": 4.1,
                            "userRatingCount": 88,
                            "internationalPhoneNumber": "+886 2 1234 5678",
                            "websiteUri": "https://sunrise.example"
                        },
                        {"id": "p2", "displayName": {"text": "Moon Cafe"}},
                        {"displayName": {"text": "Missing Id"}}
                    ]
                }));
            })
            .await;

        let candidates = client_for(&server)
            .search(&sample_submission())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "p1");
        assert_eq!(candidates[0].display_name.as_deref(), Some("Sunrise Cafe"));
        assert_eq!(candidates[0].primary_category.as_deref(), Some("Cafe"));
        assert_eq!(candidates[0].rating, Some(4.1));
        assert_eq!(candidates[0].review_count, Some(88));
        assert_eq!(candidates[1].address, None);
    }

    #[tokio::test]
    async fn test_search_zero_candidates_is_no_match() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/places:searchText");
                then.status(200).json_body(json!({}));
            })
            .await;

        let result = client_for(&server).search(&sample_submission()).await;
        assert_eq!(result, Err(DiagnosisError::NoMatchFound));
    }

    #[tokio::test]
    async fn test_search_non_success_carries_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/places:searchText");
                then.status(403).body("API key not valid");
            })
            .await;

        let result = client_for(&server).search(&sample_submission()).await;
        assert_eq!(
            result,
            Err(DiagnosisError::Upstream {
                status: 403,
                body: "API key not valid".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_detail_fetch_maps_record() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/places/p1")
                    .query_param("languageCode", "zh-TW")
                    .query_param("regionCode", "TW")
                    .header("x-goog-api-key", "places-key");
                then.status(200).json_body(json!({
                    "id": "p1",
                    "displayName": {"text": "Sunrise Cafe (Main)"},
                    "rating": 4.3,
                    "reviews": [{"authorAttribution": {"displayName": "Mei"}, "originalText": {"text": "great"}}]
                }));
            })
            .await;

        let detail = client_for(&server).fetch_detail("p1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(detail.display_name.as_deref(), Some("Sunrise Cafe (Main)"));
        assert_eq!(detail.rating, Some(4.3));
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].author, "Mei");
    }

    #[tokio::test]
    async fn test_detail_failures_degrade_to_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/places/broken");
                then.status(500).body("backend error");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/places/garbled");
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(&server);
        assert!(client.fetch_detail("broken").await.is_none());
        assert!(client.fetch_detail("garbled").await.is_none());
    }
}
