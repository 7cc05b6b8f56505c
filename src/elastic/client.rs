use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use super::types::{
    ErrorResponse, SearchResponse, UpdateResponse, increment_body, index_mapping, search_body,
};
use crate::config::ElasticConfig;
use crate::suggest::{BackendError, SuggestionBackend, SuggestionHit};

/// Server-side retries Elasticsearch performs before reporting a version conflict.
const RETRY_ON_CONFLICT: u32 = 3;

/// Document ids are interpolated into URL paths; keep only `[A-Za-z0-9_-]` literal.
const ID_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

#[derive(Debug, thiserror::Error)]
pub enum ElasticError {
    #[error("version conflict")]
    Conflict,

    #[error("Elasticsearch error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<ElasticError> for BackendError {
    fn from(e: ElasticError) -> Self {
        match e {
            ElasticError::Conflict => BackendError::Conflict,
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Client for one Elasticsearch index holding `{text, count}` suggestion documents.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
    index: String,
    api_key: Option<ApiKey>,
}

impl ElasticClient {
    pub fn new(http: Client, config: &ElasticConfig) -> Self {
        Self {
            http,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            index: config.index.clone(),
            api_key: config.api_key.clone().map(ApiKey),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, index: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            api_key: None,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}{path}", self.base_url, self.index);
        let mut req = self
            .http
            .request(method, &url)
            .header("User-Agent", crate::USER_AGENT);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("ApiKey {}", key.0));
        }
        req
    }

    pub async fn index_exists(&self) -> Result<bool, ElasticError> {
        let response = self.request(Method::HEAD, "").send().await?;
        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(true),
            404 => Ok(false),
            code => Err(ElasticError::Api {
                code,
                message: format!("HTTP {status} checking index"),
            }),
        }
    }

    /// Create the index with the suggestion mapping. Losing a creation race
    /// to another process is not an error.
    pub async fn create_index(&self) -> Result<(), ElasticError> {
        let response = self
            .request(Method::PUT, "")
            .json(&index_mapping())
            .send()
            .await?;
        if response.status().is_success() {
            debug!(index = %self.index, "created autocomplete index");
            return Ok(());
        }
        match api_error(response).await {
            ElasticError::Api { message, .. }
                if message.starts_with("resource_already_exists_exception") =>
            {
                debug!(index = %self.index, "autocomplete index already exists");
                Ok(())
            }
            e => Err(e),
        }
    }

    pub async fn increment_count(
        &self,
        key: &str,
        display_text: &str,
    ) -> Result<Option<u64>, ElasticError> {
        let path = format!(
            "/_update/{}?retry_on_conflict={RETRY_ON_CONFLICT}&_source=true",
            encode_id(key)
        );
        let response = self
            .request(Method::POST, &path)
            .json(&increment_body(display_text))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: UpdateResponse = response.json().await?;
        let count = body.get.and_then(|g| g.source).and_then(|doc| doc.count);
        debug!(
            index = %self.index,
            result = body.result.as_deref().unwrap_or("unknown"),
            count,
            "suggestion count incremented"
        );
        Ok(count)
    }

    pub async fn search_suggestions(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionHit>, ElasticError> {
        let response = self
            .request(Method::POST, "/_search")
            .json(&search_body(term, limit))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: SearchResponse = response.json().await?;
        let hits: Vec<SuggestionHit> = body
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .map(|doc| SuggestionHit {
                text: doc.text,
                count: doc.count,
            })
            .collect();
        debug!(index = %self.index, hits = hits.len(), "suggestion search complete");
        Ok(hits)
    }
}

impl SuggestionBackend for ElasticClient {
    async fn ensure_index(&self) -> Result<(), BackendError> {
        if !self.index_exists().await? {
            self.create_index().await?;
        }
        Ok(())
    }

    async fn increment(&self, key: &str, display_text: &str) -> Result<Option<u64>, BackendError> {
        Ok(self.increment_count(key, display_text).await?)
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<SuggestionHit>, BackendError> {
        Ok(self.search_suggestions(term, limit).await?)
    }
}

fn encode_id(key: &str) -> String {
    utf8_percent_encode(key, ID_ENCODE_SET).to_string()
}

async fn api_error(response: Response) -> ElasticError {
    let status = response.status();
    if status == reqwest::StatusCode::CONFLICT {
        warn!("Elasticsearch version conflict");
        return ElasticError::Conflict;
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(ErrorResponse {
            error: Some(detail),
        }) => detail.message(),
        _ => {
            let end = text.floor_char_boundary(200);
            format!("HTTP {status}: {}", &text[..end])
        }
    };
    warn!(status = %status, %message, "Elasticsearch error");
    ElasticError::Api {
        code: status.as_u16(),
        message,
    }
}
