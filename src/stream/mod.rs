pub mod sse;
pub mod transcoder;

pub use sse::LineBuffer;
pub use transcoder::{merge_delta, ChannelState, FrameTranscoder, TranscodeStream};

/// Marker emitted before the first reasoning token of a span.
pub const REASONING_OPEN: &str = "<think>\n";
/// Marker emitted when visible content follows a reasoning span.
pub const REASONING_CLOSE: &str = "</think>\n\n";
/// Upstream delta / message field carrying the reasoning channel.
pub const REASONING_FIELD: &str = "reasoning_content";

/// What happens to the upstream reasoning channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasoningMode {
    /// Drop reasoning; `content` is always a defined string.
    #[default]
    Suppress,
    /// Splice reasoning into `content` between `<think>` markers.
    Merge,
}

impl ReasoningMode {
    #[must_use]
    pub fn from_show_reasoning(show_reasoning: bool) -> Self {
        if show_reasoning {
            ReasoningMode::Merge
        } else {
            ReasoningMode::Suppress
        }
    }
}
