use std::env;

use url::Url;

use crate::ranker::DEFAULT_TOP_K;

const DEFAULT_LANGUAGES: &str = "de,en";
const DEFAULT_INDEX: &str = "autocomplete";
const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("QARANK_TOP_K must be a positive integer, got '{0}'")]
    InvalidTopK(String),

    #[error("QARANK_LANGUAGES must list at least one language code")]
    NoLanguages,

    #[error("QARANK_AUTOCOMPLETE_INDEX is not a valid index name: '{0}'")]
    InvalidIndex(String),

    #[error("ELASTICSEARCH_URL is not a valid HTTP(S) URL: '{0}'")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticConfig {
    pub url: Url,
    pub index: String,
    pub api_key: Option<String>,
}

/// Startup configuration, read once from the environment.
///
/// - `QARANK_TOP_K`: default number of answers (default 10)
/// - `QARANK_LANGUAGES`: comma-separated supported language codes, first is the fallback (default `de,en`)
/// - `QARANK_AUTOCOMPLETE_INDEX`: suggestion index name (default `autocomplete`)
/// - `ELASTICSEARCH_URL`: cluster base URL (default `http://localhost:9200`)
/// - `ELASTICSEARCH_API_KEY`: encoded API key sent as `Authorization: ApiKey` (optional)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub default_top_k: usize,
    pub languages: Vec<String>,
    pub elastic: ElasticConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let default_top_k = match var("QARANK_TOP_K") {
            None => DEFAULT_TOP_K,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|k| *k > 0)
                .ok_or(ConfigError::InvalidTopK(raw))?,
        };

        let languages: Vec<String> = var("QARANK_LANGUAGES")
            .unwrap_or_else(|| DEFAULT_LANGUAGES.to_string())
            .split(',')
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty())
            .collect();
        if languages.is_empty() {
            return Err(ConfigError::NoLanguages);
        }

        let index = var("QARANK_AUTOCOMPLETE_INDEX").unwrap_or_else(|| DEFAULT_INDEX.to_string());
        if !is_valid_index_name(&index) {
            return Err(ConfigError::InvalidIndex(index));
        }

        let raw_url =
            var("ELASTICSEARCH_URL").unwrap_or_else(|| DEFAULT_ELASTICSEARCH_URL.to_string());
        let url = Url::parse(&raw_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or(ConfigError::InvalidUrl(raw_url))?;

        Ok(Self {
            default_top_k,
            languages,
            elastic: ElasticConfig {
                url,
                index,
                api_key: var("ELASTICSEARCH_API_KEY"),
            },
        })
    }
}

/// Lowercase, no path or query metacharacters, not `.`/`..`, not starting with `-`, `_` or `+`.
fn is_valid_index_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name != "."
        && name != ".."
        && !name.starts_with(['-', '_', '+'])
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}
