use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata carried from the retriever to the caller untouched.
pub type Meta = Map<String, Value>;

/// A retrieved passage together with the scores the upstream model assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Candidate {
    /// Passage text
    pub text: String,
    /// Answer probability in [0, 1] assigned by the reader model
    pub probability: f64,
    /// Retriever relevance score (opaque, passed through)
    #[serde(default)]
    pub score: Option<f64>,
    /// Identifier of the originating document
    pub document_id: String,
    /// Arbitrary metadata; a string `answer` entry is used as the answer text
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: String,
    pub offset_start: usize,
    pub offset_end: usize,
    pub probability: f64,
    pub score: Option<f64>,
    pub document_id: String,
    pub meta: Meta,
}

impl From<Candidate> for Answer {
    fn from(candidate: Candidate) -> Self {
        let answer = match candidate.meta.get("answer") {
            Some(Value::String(s)) => s.clone(),
            _ => candidate.text.clone(),
        };
        Self {
            answer,
            context: candidate.text,
            offset_start: 0,
            offset_end: 0,
            probability: candidate.probability,
            score: candidate.score,
            document_id: candidate.document_id,
            meta: candidate.meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankResult {
    pub query: String,
    pub answers: Vec<Answer>,
}

/// One entry of a batch ranking request.
// Fields are only read by the schema and deserializer; batch ranking is unavailable.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RankRequest {
    /// Question text
    pub query: String,
    /// Candidate passages for this question
    pub candidates: Vec<Candidate>,
}
