use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use super::backend::{BackendError, SuggestionBackend, SuggestionHit};

#[derive(Debug, Clone)]
struct Record {
    text: String,
    count: Option<u64>,
    inserted: usize,
}

/// In-process stand-in for the suggestion index. Matching is a
/// case-insensitive substring test.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, Record>>,
    pending_conflicts: AtomicU32,
    unavailable: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every call fails as if the server were unreachable.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Make the next `n` increments fail with a version conflict.
    pub fn fail_with_conflicts(&self, n: u32) {
        self.pending_conflicts.store(n, Ordering::SeqCst);
    }

    /// Store a record verbatim, bypassing increment semantics.
    pub fn insert_raw(&self, key: &str, text: &str, count: Option<u64>) {
        let mut records = self.records.lock().unwrap();
        let inserted = records.len();
        records.insert(
            key.to_string(),
            Record {
                text: text.to_string(),
                count,
                inserted,
            },
        );
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        self.records.lock().unwrap().get(key).and_then(|r| r.count)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.records.lock().unwrap().get(key).map(|r| r.text.clone())
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable {
            return Err(BackendError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl SuggestionBackend for MemoryBackend {
    async fn ensure_index(&self) -> Result<(), BackendError> {
        self.check_available()
    }

    async fn increment(&self, key: &str, display_text: &str) -> Result<Option<u64>, BackendError> {
        self.check_available()?;
        let conflict = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(BackendError::Conflict);
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| BackendError::Unavailable("lock poisoned".into()))?;
        let inserted = records.len();
        let record = records.entry(key.to_string()).or_insert_with(|| Record {
            text: display_text.to_string(),
            count: Some(0),
            inserted,
        });
        let count = record.count.unwrap_or(0) + 1;
        record.count = Some(count);
        Ok(Some(count))
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<SuggestionHit>, BackendError> {
        self.check_available()?;
        let term = term.to_lowercase();
        let records = self
            .records
            .lock()
            .map_err(|_| BackendError::Unavailable("lock poisoned".into()))?;
        let mut matches: Vec<&Record> = records
            .values()
            .filter(|r| r.count.is_some() && r.text.to_lowercase().contains(&term))
            .collect();
        matches.sort_by(|a, b| b.count.cmp(&a.count).then(a.inserted.cmp(&b.inserted)));
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|r| SuggestionHit {
                text: r.text.clone(),
                count: r.count,
            })
            .collect())
    }
}
