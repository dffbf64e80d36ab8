//! HTTP client for the newsletter backend and the news-sources listing
//!
//! Implements every collaborator the client core talks to:
//! - [`CatalogSource`]: `GET <catalog_url>` returning `{ "sources": [...] }`
//! - [`PreferenceStore`]: `PUT /preferences/{username}`
//! - [`RewardsBackend`]: `POST /points/update` and `PATCH /news/{username}/mark_as_read`

use async_trait::async_trait;
use inboxzing_common::{ClientConfig, CollaboratorError, CollaboratorResult};
use preference_wizard::{CatalogEntry, CatalogSource, PreferencePayload, PreferenceStore};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::worker::RewardsBackend;

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    #[serde(default)]
    sources: Vec<SourceRecord>,
}

#[derive(Debug, Deserialize)]
struct SourceRecord {
    id: String,
    name: String,
    category: String,
    country: String,
}

impl From<SourceRecord> for CatalogEntry {
    fn from(record: SourceRecord) -> Self {
        CatalogEntry {
            country: record.country,
            category: record.category,
            id: record.id,
            name: record.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_base_url: Url,
    catalog_url: Url,
    catalog_api_key: Option<String>,
}

impl ApiClient {
    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            http,
            api_base_url: parse_base(&config.api_base_url)?,
            catalog_url: parse_base(&config.catalog_url)?,
            catalog_api_key: config.catalog_api_key.clone(),
        })
    }

    /// `api_base_url` with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> CollaboratorResult<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::Network(format!("{} is not a base URL", self.api_base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn fetch_sources(&self) -> CollaboratorResult<Vec<CatalogEntry>> {
        let mut request = self.http.get(self.catalog_url.clone());
        if let Some(key) = &self.catalog_api_key {
            request = request.query(&[("apiKey", key.as_str())]);
        }

        let response = check(request.send().await.map_err(transport_error)?).await?;
        let body: SourcesResponse = response.json().await.map_err(transport_error)?;

        info!(sources = body.sources.len(), "Fetched news sources");
        Ok(body.sources.into_iter().map(CatalogEntry::from).collect())
    }

    pub async fn put_preferences(
        &self,
        username: &str,
        payload: &PreferencePayload,
    ) -> CollaboratorResult<()> {
        let url = self.endpoint(&["preferences", username])?;
        debug!(username, %url, "Updating preferences");

        check(
            self.http
                .put(url)
                .json(payload)
                .send()
                .await
                .map_err(transport_error)?,
        )
        .await?;
        Ok(())
    }

    pub async fn post_points(&self, username: &str, points: u64) -> CollaboratorResult<String> {
        let url = self.endpoint(&["points", "update"])?;
        let points = points.to_string();

        let response = check(
            self.http
                .post(url)
                .query(&[("username", username), ("points", points.as_str())])
                .send()
                .await
                .map_err(transport_error)?,
        )
        .await?;

        let body: MessageResponse = response.json().await.map_err(transport_error)?;
        Ok(body.message)
    }

    pub async fn patch_mark_as_read(
        &self,
        username: &str,
        article_url: &str,
        reading_secs: u64,
    ) -> CollaboratorResult<()> {
        let url = self.endpoint(&["news", username, "mark_as_read"])?;
        let reading_time = reading_secs.to_string();

        check(
            self.http
                .patch(url)
                .query(&[("article_url", article_url), ("readingTime", reading_time.as_str())])
                .send()
                .await
                .map_err(transport_error)?,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn fetch_catalog(&self) -> CollaboratorResult<Vec<CatalogEntry>> {
        self.fetch_sources().await
    }
}

#[async_trait]
impl PreferenceStore for ApiClient {
    async fn save_preferences(
        &self,
        username: &str,
        payload: &PreferencePayload,
    ) -> CollaboratorResult<()> {
        self.put_preferences(username, payload).await
    }
}

#[async_trait]
impl RewardsBackend for ApiClient {
    async fn update_points(&self, username: &str, points: u64) -> CollaboratorResult<String> {
        self.post_points(username, points).await
    }

    async fn mark_as_read(
        &self,
        username: &str,
        article_url: &str,
        reading_secs: u64,
    ) -> CollaboratorResult<()> {
        self.patch_mark_as_read(username, article_url, reading_secs)
            .await
    }
}

fn parse_base(raw: &str) -> SyncResult<Url> {
    let url = Url::parse(raw).map_err(|e| SyncError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(SyncError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

/// Non-2xx responses become `Rejected`
async fn check(response: Response) -> CollaboratorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(status = status.as_u16(), %body, "Backend rejected request");
    Err(CollaboratorError::rejected(status.as_u16(), body))
}

fn transport_error(err: reqwest::Error) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout(err.to_string())
    } else if err.is_decode() {
        CollaboratorError::Decode(err.to_string())
    } else {
        CollaboratorError::Network(err.to_string())
    }
}
