//! Autocomplete suggestions: frequency-counted question index with ranked lookup.

mod backend;
#[cfg(test)]
pub(crate) mod memory;

pub use backend::{BackendError, SuggestionBackend, SuggestionHit};

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::language::LanguageGate;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Upper bound on a document id in the backing store.
const MAX_KEY_BYTES: usize = 512;
const MAX_INCREMENT_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("suggestion backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<BackendError> for SuggestError {
    fn from(e: BackendError) -> Self {
        SuggestError::BackendUnavailable(e.to_string())
    }
}

/// The backing index could not be prepared at startup.
#[derive(Debug, thiserror::Error)]
#[error("autocomplete index initialization failed: {0}")]
pub struct InitError(#[source] pub BackendError);

/// Case-insensitive dedup key for a suggestion.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct SuggestionStore<B> {
    backend: B,
}

impl<B: SuggestionBackend> SuggestionStore<B> {
    /// Prepare the backing index and take ownership of the backend handle.
    pub async fn open(backend: B) -> Result<Self, InitError> {
        let store = Self { backend };
        store.ensure_index().await.map_err(InitError)?;
        Ok(store)
    }

    /// Idempotent; safe to call again after the index was dropped externally.
    pub async fn ensure_index(&self) -> Result<(), BackendError> {
        self.backend.ensure_index().await
    }

    /// Record one more submission of `text`.
    ///
    /// The first submission creates the record with a count of 1 and keeps
    /// its trimmed text for display; later ones only increment the count.
    /// Returns the new count when the backend reports it.
    pub async fn submit(&self, text: &str) -> Result<Option<u64>, SuggestError> {
        let display = text.trim();
        let key = normalize(display);
        if !key.chars().any(char::is_alphanumeric) {
            return Err(SuggestError::InvalidParameter(
                "suggestion text must contain at least one letter or digit".into(),
            ));
        }
        if key.len() > MAX_KEY_BYTES {
            return Err(SuggestError::InvalidParameter(format!(
                "suggestion text exceeds {MAX_KEY_BYTES} bytes"
            )));
        }

        for attempt in 0..MAX_INCREMENT_ATTEMPTS {
            match self.backend.increment(&key, display).await {
                Ok(count) => {
                    debug!(key = %key, count, "suggestion submitted");
                    return Ok(count);
                }
                Err(BackendError::Conflict) => {
                    if attempt + 1 < MAX_INCREMENT_ATTEMPTS {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying suggestion increment after conflict"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "suggestion submit failed");
                    return Err(e.into());
                }
            }
        }

        warn!(key = %key, "suggestion increment kept conflicting");
        Err(SuggestError::BackendUnavailable(format!(
            "increment still conflicting after {MAX_INCREMENT_ATTEMPTS} attempts"
        )))
    }

    /// Display texts of suggestions matching `term`, most frequent first.
    /// Records without a count are never returned.
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<String>, SuggestError> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(String, u64)> = self
            .backend
            .search(term, limit)
            .await
            .inspect_err(|e| warn!(error = %e, "suggestion search failed"))?
            .into_iter()
            .filter_map(|hit| hit.count.map(|count| (hit.text, count)))
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits.truncate(limit);

        Ok(hits.into_iter().map(|(text, _)| text).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutocompleteResponse {
    pub results: Vec<String>,
    pub language: &'static str,
}

/// Suggestions for a partially typed question, labelled with its language.
pub async fn handle_autocomplete<B: SuggestionBackend>(
    store: &SuggestionStore<B>,
    gate: &LanguageGate,
    search: &str,
) -> Result<AutocompleteResponse, SuggestError> {
    let results = store.search(search, DEFAULT_SEARCH_LIMIT).await?;
    let language = gate.classify(search);
    Ok(AutocompleteResponse { results, language })
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}
