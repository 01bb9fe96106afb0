use crate::protocol::openai_chat::response::Usage;
use crate::protocol::openai_chat::DialogueTurn;
use std::time::Duration;
use tracing::info;

/// Estimate the number of tokens in `text`.
///
/// Uses a lightweight heuristic (`bytes / 4`) to avoid loading model BPE tables.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Estimated prompt tokens for the turns sent upstream.
#[must_use]
pub fn estimate_dialogue_tokens(turns: &[DialogueTurn]) -> u64 {
    turns.iter().map(|turn| estimate_tokens(&turn.content.text())).sum()
}

/// Fill zero counts in `upstream` from local estimates.
#[must_use]
pub fn merge_usage(upstream: &Usage, estimated_prompt: u64, estimated_completion: u64) -> Usage {
    let prompt_tokens = if upstream.prompt_tokens > 0 {
        upstream.prompt_tokens
    } else {
        estimated_prompt
    };
    let completion_tokens = if upstream.completion_tokens > 0 {
        upstream.completion_tokens
    } else {
        estimated_completion
    };
    let total_tokens = if upstream.total_tokens > 0 {
        upstream.total_tokens
    } else {
        prompt_tokens + completion_tokens
    };
    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    }
}

/// Log token usage for a completed request at INFO level.
pub fn log_request_usage(
    client_model: &str,
    upstream_model: &str,
    usage: &Usage,
    duration: Duration,
) {
    info!(
        model = client_model,
        upstream_model = upstream_model,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        duration_seconds = duration.as_secs_f64(),
        "request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::openai_chat::Role;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_dialogue_tokens() {
        let turns = vec![
            DialogueTurn::new(Role::System, "12345678"),
            DialogueTurn::new(Role::User, "123"),
        ];
        assert_eq!(estimate_dialogue_tokens(&turns), 3);
    }

    #[test]
    fn test_merge_usage_prefers_upstream() {
        let upstream = Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        };
        assert_eq!(merge_usage(&upstream, 999, 999), upstream);
    }

    #[test]
    fn test_merge_usage_fills_zero() {
        let merged = merge_usage(&Usage::default(), 30, 10);
        assert_eq!(merged.prompt_tokens, 30);
        assert_eq!(merged.completion_tokens, 10);
        assert_eq!(merged.total_tokens, 40);
    }
}
