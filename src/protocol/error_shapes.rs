/// OpenAI-style error body: `{ error: { message, type, code } }`.
///
/// `code` carries the numeric HTTP status, which is what OpenAI SDK clients
/// surface to the user alongside the message.
#[must_use]
pub(crate) fn openai_error_payload(status: http::StatusCode, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "message": message,
            "type": "invalid_request_error",
            "code": status.as_u16(),
        }
    })
}
