pub mod token_counter;

use crate::protocol::openai_chat::response::Usage;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (TRACE, DEBUG, INFO, WARN, ERROR)
///
/// A set `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(tracing_level(&level)).unwrap_or_else(|_| EnvFilter::new("INFO"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

fn tracing_level(level: &str) -> &str {
    match level {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    }
}

/// Log token usage for a completed request, computing duration from start time.
pub fn log_request_complete(
    client_model: &str,
    upstream_model: &str,
    usage: &Usage,
    start_time: std::time::Instant,
) {
    token_counter::log_request_usage(client_model, upstream_model, usage, start_time.elapsed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_level_aliases() {
        assert_eq!(tracing_level("WARNING"), "WARN");
        assert_eq!(tracing_level("CRITICAL"), "ERROR");
        assert_eq!(tracing_level("DEBUG"), "DEBUG");
    }
}
