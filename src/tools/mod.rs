mod errors;
mod params;

pub use params::{AskBatchParams, AskParams, AutocompleteParams, SubmitQuestionParams};

use std::time::Duration;

use reqwest::Client;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use tracing::{info, warn};

use errors::{autocomplete_disabled_error, rank_to_mcp_error, suggest_to_mcp_error};

use crate::config::Config;
use crate::elastic::ElasticClient;
use crate::language::{LanguageError, LanguageGate};
use crate::ranker::AnswerRanker;
use crate::suggest::{SuggestionStore, handle_autocomplete};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Global HTTP client timeout covering connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid QARANK_LANGUAGES: {0}")]
    Language(#[from] LanguageError),
}

/// MCP server handler providing answer ranking and autocomplete tools.
///
/// The autocomplete index is prepared once at startup. If that fails the
/// ranking tools keep working and the autocomplete tools report the cause.
#[derive(Clone)]
pub struct QaRank {
    ranker: AnswerRanker,
    gate: LanguageGate,
    suggestions: Result<SuggestionStore<ElasticClient>, String>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl QaRank {
    pub async fn new(config: &Config) -> Result<Self, StartupError> {
        let gate = LanguageGate::new(config.languages.as_slice())?;
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let elastic = ElasticClient::new(http, &config.elastic);
        let index = elastic.index().to_string();

        let suggestions = SuggestionStore::open(elastic)
            .await
            .inspect(|_| info!(index = %index, "autocomplete index ready"))
            .inspect_err(|e| tracing::error!(index = %index, "{e}; autocomplete disabled"))
            .map_err(|e| e.to_string());

        info!(
            default_top_k = config.default_top_k,
            languages = ?gate.languages(),
            "qarank configured"
        );

        Ok(Self {
            ranker: AnswerRanker::new(config.default_top_k),
            gate,
            suggestions,
            tool_router: Self::tool_router(),
        })
    }

    fn suggestions(&self) -> Result<&SuggestionStore<ElasticClient>, McpError> {
        self.suggestions
            .as_ref()
            .map_err(|reason| autocomplete_disabled_error(reason))
    }

    #[tool(
        name = "ask",
        description = "Rank candidate passages retrieved for a question. Returns the question and up to top_k answers sorted by reader probability (highest first, ties keep input order) with context, offsets, retriever score, document id and metadata."
    )]
    async fn ask(&self, Parameters(params): Parameters<AskParams>) -> Result<CallToolResult, McpError> {
        info!(
            query = %params.query,
            candidates = params.candidates.len(),
            top_k = ?params.top_k,
            "tool:ask"
        );

        let result = self
            .ranker
            .rank(&params.query, params.candidates, params.top_k)
            .map_err(rank_to_mcp_error)?;

        info!(answers = result.answers.len(), "ask complete");
        Ok(CallToolResult::success(vec![Content::json(&result)?]))
    }

    #[tool(
        name = "ask_batch",
        description = "Batch variant of ask. Not available: always fails; call ask once per question instead."
    )]
    async fn ask_batch(
        &self,
        Parameters(params): Parameters<AskBatchParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(requests = params.requests.len(), "tool:ask_batch");

        let results = self
            .ranker
            .rank_batch(params.requests)
            .map_err(rank_to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::json(&results)?]))
    }

    #[tool(
        name = "autocomplete",
        description = "Suggest previously asked questions matching a partially typed question, most frequently asked first (at most 10), together with the detected language of the input."
    )]
    async fn autocomplete(
        &self,
        Parameters(params): Parameters<AutocompleteParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(search = %params.search, "tool:autocomplete");

        let store = self.suggestions()?;
        let response = handle_autocomplete(store, &self.gate, &params.search)
            .await
            .map_err(suggest_to_mcp_error)?;

        info!(
            results = response.results.len(),
            language = response.language,
            "autocomplete complete"
        );
        Ok(CallToolResult::success(vec![Content::json(&response)?]))
    }

    #[tool(
        name = "submit_question",
        description = "Record a question as an autocomplete suggestion. Repeated submissions (case-insensitive) increase its rank."
    )]
    async fn submit_question(
        &self,
        Parameters(params): Parameters<SubmitQuestionParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(question = %params.question, "tool:submit_question");

        let store = self.suggestions()?;
        let count = store
            .submit(&params.question)
            .await
            .inspect_err(|e| warn!(%e, "submit_question failed"))
            .map_err(suggest_to_mcp_error)?;

        let output = match count {
            Some(n) => format!("Question recorded (asked {n} times)."),
            None => "Question recorded.".to_string(),
        };
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for QaRank {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "qarank".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "qarank ranks candidate passages into answers (ask) and serves language-tagged autocomplete suggestions built from submitted questions (autocomplete, submit_question)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::{Candidate, RankRequest};
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gate() -> LanguageGate {
        LanguageGate::new(&["de", "en"]).unwrap()
    }

    fn qarank_without_autocomplete() -> QaRank {
        QaRank {
            ranker: AnswerRanker::default(),
            gate: gate(),
            suggestions: Err("connection refused".into()),
            tool_router: QaRank::tool_router(),
        }
    }

    async fn qarank_with_elastic(server: &MockServer) -> QaRank {
        Mock::given(method("HEAD"))
            .and(path("/autocomplete"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        let elastic = ElasticClient::with_base_url(Client::new(), &server.uri(), "autocomplete");
        QaRank {
            ranker: AnswerRanker::default(),
            gate: gate(),
            suggestions: Ok(SuggestionStore::open(elastic).await.unwrap()),
            tool_router: QaRank::tool_router(),
        }
    }

    fn candidate(id: &str, probability: f64) -> Candidate {
        Candidate {
            text: format!("passage {id}"),
            probability,
            score: Some(1.0),
            document_id: id.into(),
            meta: Default::default(),
        }
    }

    fn json_body(result: &CallToolResult) -> Value {
        let text = &result.content[0].as_text().unwrap().text;
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn ask_returns_ranked_answers() {
        let s = qarank_without_autocomplete();
        let params = Parameters(AskParams {
            query: "Who is the father of Arya Stark?".into(),
            candidates: vec![candidate("a", 0.3), candidate("b", 0.9), candidate("c", 0.9)],
            top_k: Some(2),
        });

        let result = s.ask(params).await.unwrap();
        let body = json_body(&result);
        assert_eq!(body["query"], "Who is the father of Arya Stark?");
        let ids: Vec<&str> = body["answers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["document_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[tokio::test]
    async fn ask_with_no_candidates_returns_empty_answers() {
        let s = qarank_without_autocomplete();
        let params = Parameters(AskParams {
            query: "q".into(),
            candidates: vec![],
            top_k: None,
        });
        let body = json_body(&s.ask(params).await.unwrap());
        assert_eq!(body, json!({"query": "q", "answers": []}));
    }

    #[tokio::test]
    async fn ask_rejects_negative_top_k() {
        let s = qarank_without_autocomplete();
        let params = Parameters(AskParams {
            query: "q".into(),
            candidates: vec![candidate("a", 0.5)],
            top_k: Some(-3),
        });
        let err = s.ask(params).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode(-32602));
        assert!(err.message.contains("top_k"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn ask_batch_is_unsupported() {
        let s = qarank_without_autocomplete();
        for requests in [
            vec![],
            vec![RankRequest {
                query: "q".into(),
                candidates: vec![candidate("a", 0.5)],
            }],
        ] {
            let err = s
                .ask_batch(Parameters(AskBatchParams { requests }))
                .await
                .unwrap_err();
            assert!(err.message.contains("unsupported"), "got: {}", err.message);
        }
    }

    #[tokio::test]
    async fn autocomplete_reports_disabled_feature() {
        let s = qarank_without_autocomplete();
        let err = s
            .autocomplete(Parameters(AutocompleteParams {
                search: "arya".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("startup failed"), "got: {}", err.message);

        let err = s
            .submit_question(Parameters(SubmitQuestionParams {
                question: "Who is Arya?".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("connection refused"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn autocomplete_returns_results_and_language() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/autocomplete/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [
                    { "_source": { "text": "Wer ist der Vater von Arya Stark?", "count": 3 } },
                    { "_source": { "text": "Wer ist Arya?" } }
                ]}
            })))
            .mount(&server)
            .await;

        let s = qarank_with_elastic(&server).await;
        let result = s
            .autocomplete(Parameters(AutocompleteParams {
                search: "Wer ist der".into(),
            }))
            .await
            .unwrap();
        assert_eq!(
            json_body(&result),
            json!({"results": ["Wer ist der Vater von Arya Stark?"], "language": "de"})
        );
    }

    #[tokio::test]
    async fn autocomplete_backend_failure_is_retriable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/autocomplete/_search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let s = qarank_with_elastic(&server).await;
        let err = s
            .autocomplete(Parameters(AutocompleteParams {
                search: "arya".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("retriable"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn submit_question_increments_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/autocomplete/_update/who%20is%20arya%3F"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "result": "created",
                "get": { "_source": { "text": "Who is Arya?", "count": 1 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = qarank_with_elastic(&server).await;
        let result = s
            .submit_question(Parameters(SubmitQuestionParams {
                question: " Who is Arya? ".into(),
            }))
            .await
            .unwrap();
        let text = &result.content[0].as_text().unwrap().text;
        assert!(text.contains("asked 1 times"), "got: {text}");
    }

    #[tokio::test]
    async fn submit_question_rejects_blank_text() {
        let server = MockServer::start().await;
        let s = qarank_with_elastic(&server).await;
        let err = s
            .submit_question(Parameters(SubmitQuestionParams {
                question: "   ".into(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode(-32602));
    }

    #[tokio::test]
    async fn new_disables_autocomplete_when_elastic_is_down() {
        let config = Config::from_lookup(|key| match key {
            "ELASTICSEARCH_URL" => Some("http://127.0.0.1:1".into()),
            _ => None,
        })
        .unwrap();
        let s = QaRank::new(&config).await.unwrap();
        assert!(s.suggestions.is_err());

        let body = json_body(
            &s.ask(Parameters(AskParams {
                query: "q".into(),
                candidates: vec![candidate("a", 0.5)],
                top_k: None,
            }))
            .await
            .unwrap(),
        );
        assert_eq!(body["answers"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_rejects_unknown_language() {
        let config = Config::from_lookup(|key| match key {
            "QARANK_LANGUAGES" => Some("de,klingon".into()),
            _ => None,
        })
        .unwrap();
        assert!(matches!(
            QaRank::new(&config).await,
            Err(StartupError::Language(_))
        ));
    }
}
