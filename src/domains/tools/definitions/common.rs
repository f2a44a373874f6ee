//! Common utilities shared across Apple Music tools.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::warn;

use crate::domains::music::MusicError;

/// Default limit for paged results.
pub fn default_limit() -> usize {
    10
}

/// Validate and clamp limit to the range the API accepts (1-100).
pub fn validate_limit(limit: usize) -> usize {
    limit.clamp(1, 100)
}

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result carrying a short summary plus the structured
/// payload as pretty-printed JSON.
pub fn structured_result(summary: String, data: impl Serialize) -> CallToolResult {
    match serde_json::to_string_pretty(&data) {
        Ok(json) => CallToolResult::success(vec![Content::text(summary), Content::text(json)]),
        Err(e) => error_result(&format!("Failed to serialize result: {e}")),
    }
}

/// Map an API client failure into a tool error result.
pub fn api_error_result(error: &MusicError) -> CallToolResult {
    error_result(&error.to_string())
}

/// Count of resources under `data` in an Apple Music response, when the
/// response has the usual shape.
pub fn data_len(value: &serde_json::Value) -> Option<usize> {
    value.get("data").and_then(|d| d.as_array()).map(|a| a.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_limit_clamps() {
        assert_eq!(validate_limit(0), 1);
        assert_eq!(validate_limit(10), 10);
        assert_eq!(validate_limit(500), 100);
    }

    #[test]
    fn test_data_len() {
        let value = serde_json::json!({"data": [1, 2, 3]});
        assert_eq!(data_len(&value), Some(3));
        assert_eq!(data_len(&serde_json::json!({})), None);
    }

    #[test]
    fn test_structured_result_has_summary_and_payload() {
        let result = structured_result("ok".to_string(), serde_json::json!({"a": 1}));
        assert!(!result.is_error.unwrap_or(true));
        assert_eq!(result.content.len(), 2);
    }
}
