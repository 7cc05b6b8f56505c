use std::future::Future;

/// A stored suggestion as returned by a backend lookup. `count` is `None` for
/// records written without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionHit {
    pub text: String,
    pub count: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A concurrent writer modified the record; the increment may be retried.
    #[error("version conflict on suggestion record")]
    Conflict,

    #[error("{0}")]
    Unavailable(String),
}

/// Persistent keyed store backing the autocomplete index.
/// Implemented by `ElasticClient` for production; an in-memory store is used in tests.
pub trait SuggestionBackend {
    /// Create the index when it does not exist yet. Must be idempotent.
    fn ensure_index(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Atomically add one to the record stored under `key`, creating it with
    /// `display_text` and a count of 1 when absent. Returns the new count when
    /// the backend reports it.
    fn increment(
        &self,
        key: &str,
        display_text: &str,
    ) -> impl Future<Output = Result<Option<u64>, BackendError>> + Send;

    /// Records matching `term` that carry a count, best first, at most `limit`.
    fn search(
        &self,
        term: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SuggestionHit>, BackendError>> + Send;
}
