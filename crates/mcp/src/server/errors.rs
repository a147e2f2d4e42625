//! Structured protocol error helpers.

use chrono::Utc;
use rmcp::model::ErrorData;
use serde_json::Value;

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    serde_json::json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("ncbi-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_request_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_request(
        message.clone(),
        Some(build_error_data(error_code, "bad_request", &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn internal_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "upstream", &message, context, retryable, suggested_action)),
    )
}
