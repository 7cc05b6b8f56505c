use rmcp::ErrorData as McpError;

use crate::ranker::RankError;
use crate::suggest::SuggestError;

pub(super) fn retriable_error(e: &impl std::fmt::Display) -> McpError {
    McpError::internal_error(format!("{e} (retriable)"), None)
}

pub(super) fn rank_to_mcp_error(e: RankError) -> McpError {
    match &e {
        RankError::InvalidParameter(_) => McpError::invalid_params(e.to_string(), None),
        RankError::UnsupportedOperation(_) => McpError::invalid_request(e.to_string(), None),
    }
}

pub(super) fn suggest_to_mcp_error(e: SuggestError) -> McpError {
    match &e {
        SuggestError::InvalidParameter(_) => McpError::invalid_params(e.to_string(), None),
        SuggestError::BackendUnavailable(_) => retriable_error(&e),
    }
}

pub(super) fn autocomplete_disabled_error(reason: &str) -> McpError {
    McpError::internal_error(
        format!("autocomplete is disabled because startup failed: {reason}"),
        None,
    )
}
