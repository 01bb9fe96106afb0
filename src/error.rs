use crate::protocol::error_shapes::openai_error_payload;

/// Error type shared by the request path.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Endpoint {path} not found")]
    NotFound { path: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status reported to the inbound caller.
    ///
    /// Upstream failures keep the upstream status when it is a valid error
    /// code; everything without a status collapses to 500.
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        match self {
            ProxyError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            ProxyError::NotFound { .. } => http::StatusCode::NOT_FOUND,
            ProxyError::Upstream { status, .. } => http::StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
            ProxyError::Config(_) | ProxyError::Transport(_) | ProxyError::Internal(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Format an error as `(status, JSON body)`.
#[must_use]
pub fn format_error(err: &ProxyError) -> (http::StatusCode, serde_json::Value) {
    let status = err.status();
    let body = openai_error_payload(status, &err.to_string());
    (status, body)
}

/// Convert a `ProxyError` into an axum response.
#[must_use]
pub fn into_axum_response(err: &ProxyError) -> axum::response::Response {
    use axum::response::IntoResponse;
    let (status, body) = format_error(err);
    (status, axum::Json(body)).into_response()
}

impl axum::response::IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        into_axum_response(&self)
    }
}
