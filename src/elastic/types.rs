use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Stored form of a suggestion record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionDoc {
    pub text: String,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Debug, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source")]
    pub source: Option<SuggestionDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Structured {
        #[serde(rename = "type")]
        kind: String,
        reason: Option<String>,
    },
    Plain(String),
}

impl ErrorDetail {
    pub fn message(&self) -> String {
        match self {
            ErrorDetail::Structured {
                kind,
                reason: Some(reason),
            } => format!("{kind}: {reason}"),
            ErrorDetail::Structured { kind, reason: None } => kind.clone(),
            ErrorDetail::Plain(s) => s.clone(),
        }
    }
}

pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "text": { "type": "text" },
                "count": { "type": "long" }
            }
        }
    })
}

/// Painless script that bumps `count`, initialising it when a record was
/// written without one.
pub const INCREMENT_SCRIPT: &str = "if (ctx._source.count == null) { ctx._source.count = params.increment } else { ctx._source.count += params.increment }";

/// Scripted update for an existing record; `upsert` creates the record on
/// first submission.
pub fn increment_body(display_text: &str) -> Value {
    json!({
        "script": {
            "source": INCREMENT_SCRIPT,
            "lang": "painless",
            "params": { "increment": 1 }
        },
        "upsert": {
            "text": display_text,
            "count": 1
        }
    })
}

pub fn search_body(term: &str, limit: usize) -> Value {
    json!({
        "_source": ["text", "count"],
        "query": {
            "bool": {
                "must": [{ "match": { "text": term } }],
                "filter": [{ "exists": { "field": "count" } }]
            }
        },
        "size": limit,
        "sort": [{ "count": { "order": "desc" } }]
    })
}

#[derive(Debug, Deserialize)]
pub struct UpdateResponse {
    pub result: Option<String>,
    pub get: Option<GetResult>,
}

#[derive(Debug, Deserialize)]
pub struct GetResult {
    #[serde(rename = "_source")]
    pub source: Option<SuggestionDoc>,
}
