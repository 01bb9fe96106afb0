use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;

use crate::augment::{augment, collect_keys};
use crate::error::{into_axum_response, ProxyError};
use crate::observability::{log_request_complete, token_counter};
use crate::protocol::openai_chat::response::{map_response, UpstreamChatResponse, Usage};
use crate::protocol::openai_chat::{ChatCompletionRequest, ChatTemplateKwargs, UpstreamChatRequest};
use crate::state::AppState;
use crate::stream::TranscodeStream;
use crate::util::unix_now_secs;

/// `POST /v1/chat/completions`.
pub async fn handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match handler_inner(state, body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(status = err.status().as_u16(), error = %err, "chat completion failed");
            into_axum_response(&err)
        }
    }
}

fn parse_request(body: &[u8]) -> Result<ChatCompletionRequest, ProxyError> {
    serde_json::from_slice(body).map_err(|e| {
        ProxyError::InvalidRequest(format!("Invalid chat completion request body: {e}"))
    })
}

async fn handler_inner(state: Arc<AppState>, body: Bytes) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let request = parse_request(&body)?;
    let features = &state.config.features;

    let keys = collect_keys(
        &state.catalog,
        request.selected_prompt_keys(),
        &request.messages,
    );
    let levels = request.intensity_by_key(&keys);
    let stream = request.is_stream();
    let ChatCompletionRequest {
        model,
        messages,
        temperature,
        max_tokens,
        ..
    } = request;

    let turns = augment(&state.catalog, messages, &keys, &levels);
    let upstream_model = state.resolver.resolve(&model, Some(&state.transport)).await;

    let upstream_request = UpstreamChatRequest {
        model: &upstream_model,
        messages: &turns,
        temperature: temperature.unwrap_or(features.default_temperature),
        max_tokens: max_tokens.unwrap_or(features.default_max_tokens),
        stream,
        chat_template_kwargs: features
            .enable_thinking_mode
            .then_some(ChatTemplateKwargs { thinking: true }),
    };
    let payload = serde_json::to_vec(&upstream_request)
        .map_err(|e| ProxyError::Internal(format!("Failed to encode upstream request: {e}")))?;

    tracing::debug!(
        model = %model,
        upstream_model = %upstream_model,
        prompt_keys = ?keys,
        stream,
        "forwarding chat completion"
    );

    let response = state.transport.send_chat(Bytes::from(payload)).await?;

    if stream {
        let body = Body::from_stream(TranscodeStream::new(
            response.bytes_stream(),
            state.reasoning_mode(),
        ));
        return Ok(sse_ok_response(body));
    }

    let raw = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Transport(e.to_string()))?;
    let upstream: UpstreamChatResponse = serde_json::from_slice(&raw)
        .map_err(|e| ProxyError::Internal(format!("Invalid upstream response body: {e}")))?;

    let completion = map_response(
        upstream,
        &model,
        state.next_completion_id(),
        unix_now_secs(),
        state.reasoning_mode(),
    );

    let completion_estimate: u64 = completion
        .choices
        .iter()
        .map(|choice| token_counter::estimate_tokens(&choice.message.content))
        .sum();
    let usage = token_counter::merge_usage(
        &Usage::from_value(&completion.usage),
        token_counter::estimate_dialogue_tokens(&turns),
        completion_estimate,
    );
    log_request_complete(&model, &upstream_model, &usage, start);

    Ok(Json(completion).into_response())
}

#[inline]
fn sse_ok_response(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = http::StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        http::header::CACHE_CONTROL,
        http::HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        http::header::CONNECTION,
        http::HeaderValue::from_static("keep-alive"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_rejects_bad_json() {
        let err = parse_request(b"{not json").unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Invalid chat completion request body"));
    }

    #[test]
    fn test_parse_request_rejects_missing_messages() {
        let err = parse_request(br#"{"model":"gpt-4"}"#).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest(_)));
    }

    #[test]
    fn test_sse_headers() {
        let response = sse_ok_response(Body::empty());
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[http::header::CACHE_CONTROL], "no-cache");
    }
}
