//! HTTP adapter for an external content-provider service.
//!
//! Endpoints (all `GET`, JSON responses):
//! - `/channels/resolve?q=`            → `ChannelInfo`
//! - `/pages?id=&playlist=&continuation=` → `Page`
//! - `/channels/v3/pages?q=&continuation=` → `Page` (sends `X-Api-Key`)
//! - `/videos/{id}`                    → `Video`
//! - `/search?q=`                      → `Page`
//! - `/videos/{id}/transcript`         → `{ "text": ... }`

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::domain::Video;

use super::{ChannelInfo, ContentProvider, Page, ProviderError, ProviderResult};

/// Transcript response body
#[derive(Debug, Deserialize)]
struct TranscriptBody {
    text: String,
}

/// Content provider reached over HTTP
pub struct HttpProvider {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Create a new provider client for `endpoint` (base URL, no trailing slash needed)
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> anyhow::Result<Self> {
        let endpoint = config.provider_endpoint.clone().context(
            "No content provider configured. Set KINESIS_PROVIDER_URL or provider.endpoint",
        )?;
        Ok(Self::new(endpoint, config.api_key.clone()))
    }

    /// Endpoint URL with `segments` appended, each percent-encoded as one segment
    fn url(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", self.endpoint))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Provider endpoint cannot take a path: {}", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET the endpoint at `segments` with `query` and decode the JSON body.
    ///
    /// A 401/403 becomes `CredentialRequired(capability)` only when the
    /// endpoint is gated by a credential; otherwise it is a plain failure.
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        what: &str,
        capability: Option<&'static str>,
    ) -> ProviderResult<T> {
        let url = self.url(segments)?;
        debug!(path = url.path(), "Provider request");
        let mut request = self.client.get(url).query(query);
        if let Some(ref key) = self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach content provider for {}", what))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("Invalid provider response for {}", what))
                .map_err(ProviderError::from);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, what, capability, &body))
    }
}

/// Map a non-2xx status to a provider error
fn status_error(
    status: StatusCode,
    what: &str,
    capability: Option<&'static str>,
    body: &str,
) -> ProviderError {
    match (status, capability) {
        (StatusCode::NOT_FOUND, _) => ProviderError::NotFound(what.to_string()),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, Some(capability)) => {
            ProviderError::CredentialRequired(capability)
        }
        _ => anyhow!("Provider error ({}) for {}: {}", status, what, body.trim()).into(),
    }
}

#[async_trait]
impl ContentProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn resolve_channel(&self, query: &str) -> ProviderResult<ChannelInfo> {
        self.get_json(
            &["channels", "resolve"],
            &[("q", query)],
            &format!("channel {}", query),
            None,
        )
        .await
    }

    async fn fetch_page(
        &self,
        id: &str,
        is_playlist: bool,
        continuation: Option<&str>,
    ) -> ProviderResult<Page> {
        let playlist = if is_playlist { "true" } else { "false" };
        let mut query = vec![("id", id), ("playlist", playlist)];
        if let Some(token) = continuation {
            query.push(("continuation", token));
        }
        self.get_json(&["pages"], &query, &format!("page of {}", id), None)
            .await
    }

    async fn fetch_channel_page_v3(
        &self,
        query: &str,
        continuation: Option<&str>,
    ) -> ProviderResult<Page> {
        if self.api_key.is_none() {
            return Err(ProviderError::CredentialRequired("channel"));
        }
        let mut params = vec![("q", query)];
        if let Some(token) = continuation {
            params.push(("continuation", token));
        }
        self.get_json(
            &["channels", "v3", "pages"],
            &params,
            &format!("channel {}", query),
            Some("channel"),
        )
        .await
    }

    async fn fetch_video_info(&self, id: &str) -> ProviderResult<Video> {
        self.get_json(&["videos", id], &[], &format!("video {}", id), None)
            .await
    }

    async fn search_free_text(&self, query: &str) -> ProviderResult<Page> {
        let page: Page = self
            .get_json(
                &["search"],
                &[("q", query)],
                &format!("search {:?}", query),
                None,
            )
            .await?;
        Ok(Page::last(page.videos))
    }

    async fn fetch_transcript(&self, id: &str) -> ProviderResult<String> {
        let body: TranscriptBody = self
            .get_json(
                &["videos", id, "transcript"],
                &[],
                &format!("transcript of {}", id),
                Some("transcript"),
            )
            .await?;
        Ok(body.text)
    }
}
