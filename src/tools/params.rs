use schemars::JsonSchema;
use serde::Deserialize;

use crate::ranker::{Candidate, RankRequest};

#[derive(Deserialize, JsonSchema)]
pub struct AskParams {
    /// Question the candidates were retrieved for
    pub query: String,
    /// Candidate passages with reader probability and retriever score
    pub candidates: Vec<Candidate>,
    /// Maximum number of answers (default: server configuration, usually 10)
    pub top_k: Option<i64>,
}

#[derive(Deserialize, JsonSchema)]
pub struct AskBatchParams {
    /// Questions with their candidate passages
    pub requests: Vec<RankRequest>,
}

#[derive(Deserialize, JsonSchema)]
pub struct AutocompleteParams {
    /// Partially typed question
    pub search: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct SubmitQuestionParams {
    /// Question text to record as an autocomplete suggestion
    pub question: String,
}
