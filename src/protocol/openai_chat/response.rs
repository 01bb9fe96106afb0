//! Non-streaming upstream response → OpenAI `chat.completion`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Role;
use crate::stream::{ReasoningMode, REASONING_CLOSE, REASONING_OPEN};

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamChatResponse {
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
    #[serde(default)]
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: Option<UpstreamMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamMessage {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Token counts pulled out of a usage object for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Usage::deserialize(value).unwrap_or_default()
    }

    fn zero_value() -> Value {
        serde_json::json!({
            "prompt_tokens": 0,
            "completion_tokens": 0,
            "total_tokens": 0,
        })
    }
}

/// Build the client-facing completion. `client_model` is the name the
/// client asked for, not the resolved upstream model.
#[must_use]
pub fn map_response(
    upstream: UpstreamChatResponse,
    client_model: &str,
    id: String,
    created: u64,
    mode: ReasoningMode,
) -> ChatCompletionResponse {
    let choices = upstream
        .choices
        .into_iter()
        .map(|choice| {
            let message = choice.message.unwrap_or(UpstreamMessage {
                role: None,
                content: None,
                reasoning_content: None,
            });
            let content = message.content.unwrap_or_default();
            let content = match (mode, message.reasoning_content.as_deref()) {
                (ReasoningMode::Merge, Some(reasoning)) if !reasoning.is_empty() => {
                    let mut merged = String::with_capacity(
                        REASONING_OPEN.len() + reasoning.len() + 1 + REASONING_CLOSE.len() + content.len(),
                    );
                    merged.push_str(REASONING_OPEN);
                    merged.push_str(reasoning);
                    merged.push('\n');
                    merged.push_str(REASONING_CLOSE);
                    merged.push_str(&content);
                    merged
                }
                _ => content,
            };
            ChatChoice {
                index: choice.index,
                message: ChatMessage {
                    role: message.role.unwrap_or(Role::Assistant),
                    content,
                },
                finish_reason: choice.finish_reason,
            }
        })
        .collect();

    ChatCompletionResponse {
        id,
        object: "chat.completion",
        created,
        model: client_model.to_string(),
        choices,
        usage: upstream.usage.unwrap_or_else(Usage::zero_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(json: &str) -> UpstreamChatResponse {
        serde_json::from_str(json).unwrap()
    }

    const WITH_REASONING: &str = r#"{
        "id": "nim-1",
        "model": "deepseek-ai/deepseek-v3.1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Paris.", "reasoning_content": "Capital of France"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
    }"#;

    #[test]
    fn test_merge_wraps_reasoning() {
        let resp = map_response(
            upstream(WITH_REASONING),
            "gpt-4o",
            "chatcmpl-abc".into(),
            42,
            ReasoningMode::Merge,
        );
        assert_eq!(resp.model, "gpt-4o");
        assert_eq!(resp.object, "chat.completion");
        assert_eq!(
            resp.choices[0].message.content,
            "<think>\nCapital of France\n</think>\n\nParis."
        );
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage["total_tokens"], 12);
    }

    #[test]
    fn test_suppress_drops_reasoning() {
        let resp = map_response(
            upstream(WITH_REASONING),
            "gpt-4o",
            "chatcmpl-abc".into(),
            42,
            ReasoningMode::Suppress,
        );
        assert_eq!(resp.choices[0].message.content, "Paris.");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["choices"][0]["message"].get("reasoning_content").is_none());
    }

    #[test]
    fn test_missing_usage_and_content_defaults() {
        let resp = map_response(
            upstream(r#"{"choices":[{"index":0,"message":{"content":null},"finish_reason":null}]}"#),
            "m",
            "chatcmpl-x".into(),
            1,
            ReasoningMode::Merge,
        );
        assert_eq!(resp.choices[0].message.content, "");
        assert_eq!(resp.choices[0].message.role, Role::Assistant);
        assert_eq!(Usage::from_value(&resp.usage), Usage::default());
        assert_eq!(resp.usage["prompt_tokens"], 0);
    }

    #[test]
    fn test_usage_from_value() {
        let usage = Usage::from_value(&serde_json::json!({"prompt_tokens": 3, "total_tokens": 4}));
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 4);
        assert_eq!(Usage::from_value(&Value::Null), Usage::default());
    }
}
