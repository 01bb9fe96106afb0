pub mod response;

use rustc_hash::FxHashMap;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::catalog::IntensityLevel;

/// Speaker role of a dialogue turn.
///
/// Roles the proxy has no rule for (`tool`, `developer`, ...) are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[serde(untagged)]
    Other(String),
}

/// Message content as sent by the caller.
///
/// Anything other than a plain string (content-part arrays, `null`) is held
/// as raw JSON and forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Raw(serde_json::Value),
}

impl Default for TurnContent {
    fn default() -> Self {
        Self::Raw(serde_json::Value::Null)
    }
}

impl TurnContent {
    /// Text view: the string itself, or the `text` parts of an array joined
    /// together. Other shapes read as empty.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Raw(serde_json::Value::Array(parts)) => Cow::Owned(
                parts
                    .iter()
                    .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect(),
            ),
            Self::Raw(_) => Cow::Borrowed(""),
        }
    }

    /// Put `block` in front of the existing content.
    ///
    /// Strings are joined with `separator`; part arrays get a leading text
    /// part so the other parts stay as they were.
    pub fn prepend(&mut self, block: &str, separator: &str) {
        match self {
            Self::Text(text) => *text = format!("{block}{separator}{text}"),
            Self::Raw(serde_json::Value::Array(parts)) => {
                parts.insert(0, serde_json::json!({"type": "text", "text": block}));
            }
            Self::Raw(_) => *self = Self::Text(block.to_string()),
        }
    }
}

/// One chat message.
///
/// Fields other than `role` and `content` (e.g. `name`, `tool_call_id`) are
/// carried through to the upstream untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: Role,
    #[serde(default)]
    pub content: TurnContent,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DialogueTurn {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: TurnContent::Text(content.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Inbound OpenAI chat-completion request, plus the prompt selection
/// extensions.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<DialogueTurn>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default, alias = "promptKey")]
    pub prompt_key: Option<String>,
    #[serde(default, alias = "promptKeys")]
    pub prompt_keys: Option<Vec<String>>,
    /// Level applied to every selected key without its own entry in
    /// `intensities`.
    #[serde(default)]
    pub intensity: Option<IntensityLevel>,
    #[serde(default, alias = "intensitySettings")]
    pub intensities: Option<FxHashMap<String, IntensityLevel>>,
}

impl ChatCompletionRequest {
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Selected prompt keys in caller order: `prompt_keys` first, then
    /// `prompt_key`.
    #[must_use]
    pub fn selected_prompt_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.prompt_keys.clone().unwrap_or_default();
        if let Some(key) = self.prompt_key.as_deref() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys
    }

    /// Per-key intensity map with the request-wide `intensity` filled in
    /// for `keys` that have no explicit level.
    #[must_use]
    pub fn intensity_by_key(&self, keys: &[String]) -> FxHashMap<String, IntensityLevel> {
        let mut levels = self.intensities.clone().unwrap_or_default();
        if let Some(level) = self.intensity {
            for key in keys {
                levels.entry(key.clone()).or_insert(level);
            }
        }
        levels
    }
}

/// `chat_template_kwargs` extension understood by NIM reasoning models.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatTemplateKwargs {
    pub thinking: bool,
}

/// Outbound request body sent to the upstream.
#[derive(Debug, Serialize)]
pub struct UpstreamChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [DialogueTurn],
    pub temperature: f64,
    pub max_tokens: u64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_template_kwargs: Option<ChatTemplateKwargs>,
}
