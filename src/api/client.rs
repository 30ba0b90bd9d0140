use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{ConversationDetail, ConversationPage, Envelope, FacetCounts, Stats};
use crate::state::FilterSet;

/// The classification backend, as seen by the browser.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn filters(&self) -> Result<FacetCounts, ApiError>;

    async fn stats(&self) -> Result<Stats, ApiError>;

    async fn conversations(&self, filters: &FilterSet) -> Result<ConversationPage, ApiError>;

    async fn conversation(&self, session_id: &str) -> Result<ConversationDetail, ApiError>;

    /// `body` is the complete update object, see `FieldUpdate::request_body`.
    async fn update(&self, session_id: &str, body: &serde_json::Value) -> Result<(), ApiError>;
}

/// JSON-over-HTTP backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::NotABase(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    /// Build `<base>/<segments...>`, escaping each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::NotABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<Option<T>, ApiError> {
        let status = response.status();
        let envelope = match response.json::<Envelope<T>>().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(ApiError::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };

        if !envelope.success {
            return Err(ApiError::rejected(envelope.error, fallback));
        }
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        Self::read(response, fallback)
            .await?
            .ok_or(ApiError::MissingData)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn filters(&self) -> Result<FacetCounts, ApiError> {
        let url = self.url(&["api", "filters"])?;
        self.get(url, &[], "failed to load filters").await
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        let url = self.url(&["api", "stats"])?;
        self.get(url, &[], "failed to load stats").await
    }

    async fn conversations(&self, filters: &FilterSet) -> Result<ConversationPage, ApiError> {
        let url = self.url(&["api", "conversations"])?;
        self.get(url, &filters.query_pairs(), "failed to load conversations")
            .await
    }

    async fn conversation(&self, session_id: &str) -> Result<ConversationDetail, ApiError> {
        let url = self.url(&["api", "conversation", session_id])?;
        self.get(url, &[], "failed to load conversation").await
    }

    async fn update(&self, session_id: &str, body: &serde_json::Value) -> Result<(), ApiError> {
        let url = self.url(&["api", "conversation", session_id, "update"])?;
        tracing::debug!("PUT {} {}", url, body);
        let response = self.client.put(url).json(body).send().await?;
        Self::read::<serde_json::Value>(response, "failed to update conversation").await?;
        Ok(())
    }
}
