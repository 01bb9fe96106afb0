use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_LENGTH, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::api::{chat, health, models, prompts};
use crate::error::{into_axum_response, ProxyError};
use crate::state::AppState;

const CORS_ALLOW_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

#[derive(Debug, PartialEq, Eq)]
enum RouteMatch {
    Health,
    Models,
    Prompts,
    ChatCompletions,
    Preflight,
    NotFound,
}

/// Dispatch a raw HTTP request to the matching handler.
///
/// Unknown paths, and known paths with the wrong method, get the structured
/// 404 body naming the request path. `OPTIONS` on any path is a CORS
/// preflight answered with 204, and every response allows any origin.
///
/// # Errors
///
/// This function currently never returns `Err` and uses `Infallible`.
pub async fn dispatch_request(
    state: Arc<AppState>,
    base_path: Arc<str>,
    request: Request<Body>,
) -> Result<Response, Infallible> {
    let (parts, body) = request.into_parts();
    let route = match_route(&parts.method, parts.uri.path(), base_path.as_ref());

    let mut response = match route {
        RouteMatch::Health => health::health_handler(State(state)).into_response(),
        RouteMatch::Models => models::handler(State(state)).into_response(),
        RouteMatch::Prompts => prompts::handler(State(state)).into_response(),
        RouteMatch::ChatCompletions => {
            let limit = state.config.server.max_body_bytes;
            match read_request_body(body, limit).await {
                Ok(body_bytes) => chat::handler(State(state), body_bytes).await,
                Err(response) => response,
            }
        }
        RouteMatch::Preflight => preflight_response(&parts.headers),
        RouteMatch::NotFound => {
            tracing::debug!(method = %parts.method, path = parts.uri.path(), "no route");
            into_axum_response(&ProxyError::NotFound {
                path: parts.uri.path().to_string(),
            })
        }
    };

    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    Ok(response)
}

/// Preflight answer: any method the proxy serves, and whatever headers the
/// browser asked to send.
fn preflight_response(request_headers: &HeaderMap) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

#[must_use]
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("/{}", trimmed.trim_end_matches('/'))
    }
}

async fn read_request_body(body: Body, limit: usize) -> Result<bytes::Bytes, Response> {
    body::to_bytes(body, limit).await.map_err(|_| {
        into_axum_response(&ProxyError::InvalidRequest(format!(
            "Request body too large (max {limit} bytes)"
        )))
    })
}

fn match_route(method: &Method, path: &str, base_path: &str) -> RouteMatch {
    if *method == Method::OPTIONS {
        return RouteMatch::Preflight;
    }
    let Some(path) = strip_base_path(path, base_path) else {
        return RouteMatch::NotFound;
    };

    match (method, path) {
        (&Method::GET, "/health") => RouteMatch::Health,
        (&Method::GET, "/v1/models") => RouteMatch::Models,
        (&Method::GET, "/v1/prompts") => RouteMatch::Prompts,
        (&Method::POST, "/v1/chat/completions") => RouteMatch::ChatCompletions,
        _ => RouteMatch::NotFound,
    }
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    if base_path.is_empty() {
        return Some(path);
    }

    let remainder = path.strip_prefix(base_path)?;
    if remainder.is_empty() {
        Some("/")
    } else if remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_route_methods() {
        assert_eq!(match_route(&Method::GET, "/health", ""), RouteMatch::Health);
        assert_eq!(match_route(&Method::GET, "/v1/models", ""), RouteMatch::Models);
        assert_eq!(match_route(&Method::GET, "/v1/prompts", ""), RouteMatch::Prompts);
        assert_eq!(
            match_route(&Method::POST, "/v1/chat/completions", ""),
            RouteMatch::ChatCompletions
        );
        assert_eq!(
            match_route(&Method::GET, "/v1/chat/completions", ""),
            RouteMatch::NotFound
        );
        assert_eq!(match_route(&Method::GET, "/v1/other", ""), RouteMatch::NotFound);
        assert_eq!(
            match_route(&Method::OPTIONS, "/v1/chat/completions", ""),
            RouteMatch::Preflight
        );
    }

    #[test]
    fn test_preflight_echoes_requested_headers() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("authorization,content-type"),
        );
        let response = preflight_response(&request_headers);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], CORS_ALLOW_METHODS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "authorization,content-type");
        assert_eq!(headers[VARY], "Access-Control-Request-Headers");

        let response = preflight_response(&HeaderMap::new());
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_HEADERS).is_none());
    }

    #[test]
    fn test_base_path() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("proxy/"), "/proxy");
        assert_eq!(
            match_route(&Method::GET, "/proxy/health", "/proxy"),
            RouteMatch::Health
        );
        assert_eq!(
            match_route(&Method::GET, "/proxyhealth", "/proxy"),
            RouteMatch::NotFound
        );
        assert_eq!(match_route(&Method::GET, "/health", "/proxy"), RouteMatch::NotFound);
    }
}
