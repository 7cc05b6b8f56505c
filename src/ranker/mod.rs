//! Answer ranking: turns scored candidate passages into a bounded, ordered answer list.

pub mod types;

use tracing::debug;

pub use types::{Answer, Candidate, RankRequest, RankResult};

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

/// Orders candidates by reader probability. Span extraction is not performed,
/// so every answer carries offsets 0/0.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRanker {
    default_top_k: usize,
}

impl Default for AnswerRanker {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

impl AnswerRanker {
    /// `default_top_k` is validated to be positive by the config layer.
    pub fn new(default_top_k: usize) -> Self {
        Self { default_top_k }
    }

    /// Rank `candidates` for `query`, highest probability first.
    ///
    /// Equal probabilities keep their input order. `top_k` of zero yields no
    /// answers; a negative `top_k` is rejected.
    pub fn rank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: Option<i64>,
    ) -> Result<RankResult, RankError> {
        let top_k = match top_k {
            None => self.default_top_k,
            Some(k) => usize::try_from(k).map_err(|_| {
                RankError::InvalidParameter(format!("top_k must not be negative, got {k}"))
            })?,
        };

        let candidate_count = candidates.len();
        let mut answers: Vec<Answer> = candidates.into_iter().map(Answer::from).collect();
        // `sort_by` is stable, which keeps ties in arrival order.
        answers.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        answers.truncate(top_k);

        debug!(
            query,
            candidates = candidate_count,
            answers = answers.len(),
            top_k,
            "ranked answers"
        );

        Ok(RankResult {
            query: query.to_string(),
            answers,
        })
    }

    /// Batch ranking is not available; callers must rank one query at a time.
    pub fn rank_batch(&self, _requests: Vec<RankRequest>) -> Result<Vec<RankResult>, RankError> {
        Err(RankError::UnsupportedOperation(
            "batch ranking is not available; rank each query individually",
        ))
    }
}
