use alma_core::control::ControlError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Turns a control-plane result into a tool result.
///
/// Domain failures become an `is_error` result carrying the JSON error
/// mapping; only serialization problems surface as protocol errors.
pub(crate) fn tool_result<T: Serialize>(
    result: Result<T, ControlError>,
) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(value) => Ok(CallToolResult::success(vec![Content::json(value)?])),
        Err(err) => Ok(CallToolResult::error(vec![Content::json(err.to_response())?])),
    }
}
