//! Frame-by-frame rewriting of an upstream chat-completion event stream.
//!
//! Each complete `data:` line is parsed as JSON. The reasoning field of the
//! first choice's delta is either dropped or spliced into `content` between
//! `<think>` markers. The open/closed state of the marker pair is carried
//! across frames in [`ChannelState`]. Lines that are not JSON are forwarded
//! as they arrived.

use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use pin_project_lite::pin_project;
use serde_json::{Map, Value};

use super::sse::{self, LineBuffer, FRAME_END};
use super::{ReasoningMode, REASONING_CLOSE, REASONING_FIELD, REASONING_OPEN};

/// Whether an opening `<think>` marker is waiting for its close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Open,
    ReasoningOpen,
}

/// Merge one delta's reasoning and content into a single content string.
///
/// Empty strings count as absent. Reasoning is applied before content, so a
/// delta carrying both closes the span it opened.
#[must_use]
pub fn merge_delta(
    state: ChannelState,
    reasoning: Option<&str>,
    content: Option<&str>,
) -> (ChannelState, String) {
    let reasoning = reasoning.filter(|r| !r.is_empty());
    let content = content.filter(|c| !c.is_empty());

    let mut state = state;
    let mut merged = String::new();

    if let Some(reasoning) = reasoning {
        if state == ChannelState::Open {
            merged.push_str(REASONING_OPEN);
            state = ChannelState::ReasoningOpen;
        }
        merged.push_str(reasoning);
    }

    if let Some(content) = content {
        if state == ChannelState::ReasoningOpen {
            merged.push_str(REASONING_CLOSE);
            state = ChannelState::Open;
        }
        merged.push_str(content);
    }

    (state, merged)
}

/// Envelope keys copied onto the synthetic closing frame.
const ENVELOPE_KEYS: [&str; 5] = ["id", "object", "created", "model", "system_fingerprint"];

/// Per-response rewriting state.
#[derive(Debug)]
pub struct FrameTranscoder {
    mode: ReasoningMode,
    lines: LineBuffer,
    line_scratch: Vec<Bytes>,
    state: ChannelState,
    envelope: Map<String, Value>,
    frames: u64,
}

impl FrameTranscoder {
    #[must_use]
    pub fn new(mode: ReasoningMode) -> Self {
        Self {
            mode,
            lines: LineBuffer::new(),
            line_scratch: Vec::with_capacity(8),
            state: ChannelState::Open,
            envelope: Map::new(),
            frames: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    #[must_use]
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    /// Feed upstream bytes, writing every frame they complete into `out`.
    pub fn push_chunk(&mut self, chunk: &[u8], out: &mut BytesMut) {
        let mut lines = std::mem::take(&mut self.line_scratch);
        self.lines.feed_into(chunk, &mut lines);
        for line in lines.drain(..) {
            self.process_line(&line, out);
        }
        self.line_scratch = lines;
    }

    /// Upstream ended without `[DONE]`: drop any partial line and close an
    /// open reasoning span.
    pub fn finish(&mut self, out: &mut BytesMut) {
        let tail = self.lines.take_pending();
        if !tail.is_empty() {
            tracing::debug!(bytes = tail.len(), "discarding incomplete trailing line");
        }
        self.close_reasoning(out);
    }

    fn process_line(&mut self, raw: &[u8], out: &mut BytesMut) {
        let line = sse::trim_cr(raw);
        if line.is_empty() {
            return;
        }

        let Some(payload) = sse::data_payload(line) else {
            sse::write_raw_line(out, line, b"\n");
            return;
        };

        if sse::is_done_payload(payload) {
            self.close_reasoning(out);
            sse::write_raw_line(out, line, FRAME_END);
            self.frames += 1;
            return;
        }

        let mut value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "forwarding non-JSON data line unchanged");
                sse::write_raw_line(out, raw, FRAME_END);
                self.frames += 1;
                return;
            }
        };

        self.remember_envelope(&value);
        self.rewrite_delta(&mut value);

        match serde_json::to_vec(&value) {
            Ok(json) => sse::write_data_frame(out, &json),
            Err(err) => {
                tracing::debug!(error = %err, "frame re-encode failed; forwarding original");
                sse::write_raw_line(out, line, FRAME_END);
            }
        }
        self.frames += 1;
    }

    fn rewrite_delta(&mut self, payload: &mut Value) {
        let Some(delta) = payload
            .get_mut("choices")
            .and_then(Value::as_array_mut)
            .and_then(|choices| choices.first_mut())
            .and_then(|choice| choice.get_mut("delta"))
            .and_then(Value::as_object_mut)
        else {
            return;
        };

        let reasoning = match delta.remove(REASONING_FIELD) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        let content = delta
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match self.mode {
            ReasoningMode::Suppress => {
                delta.insert("content".into(), Value::String(content.unwrap_or_default()));
            }
            ReasoningMode::Merge => {
                let (next, merged) =
                    merge_delta(self.state, reasoning.as_deref(), content.as_deref());
                self.state = next;
                if !merged.is_empty() {
                    delta.insert("content".into(), Value::String(merged));
                }
            }
        }
    }

    fn remember_envelope(&mut self, payload: &Value) {
        let Some(object) = payload.as_object() else {
            return;
        };
        for key in ENVELOPE_KEYS {
            if let Some(value) = object.get(key) {
                self.envelope.insert(key.to_string(), value.clone());
            }
        }
    }

    fn close_reasoning(&mut self, out: &mut BytesMut) {
        if self.mode != ReasoningMode::Merge || self.state != ChannelState::ReasoningOpen {
            return;
        }
        self.state = ChannelState::Open;

        let mut frame = self.envelope.clone();
        frame.insert(
            "choices".into(),
            serde_json::json!([{
                "index": 0,
                "delta": { "content": REASONING_CLOSE },
                "finish_reason": null,
            }]),
        );
        match serde_json::to_vec(&Value::Object(frame)) {
            Ok(json) => {
                sse::write_data_frame(out, &json);
                self.frames += 1;
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode reasoning close frame"),
        }
    }
}

pin_project! {
    /// Stream adapter running a [`FrameTranscoder`] over upstream body chunks.
    ///
    /// An upstream error ends the downstream stream after the frames already
    /// completed; the partial line is discarded.
    pub struct TranscodeStream<S> {
        #[pin]
        upstream: S,
        transcoder: FrameTranscoder,
        out: BytesMut,
        done: bool,
    }
}

impl<S> TranscodeStream<S> {
    #[must_use]
    pub fn new(upstream: S, mode: ReasoningMode) -> Self {
        Self {
            upstream,
            transcoder: FrameTranscoder::new(mode),
            out: BytesMut::with_capacity(8 * 1024),
            done: false,
        }
    }
}

impl<S, B, E> Stream for TranscodeStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if *this.done {
                return Poll::Ready(None);
            }
            match ready!(this.upstream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.transcoder.push_chunk(chunk.as_ref(), this.out);
                }
                Some(Err(err)) => {
                    tracing::warn!(
                        error = %err,
                        frames = this.transcoder.frames_emitted(),
                        "upstream stream failed; closing downstream"
                    );
                    *this.done = true;
                }
                None => {
                    this.transcoder.finish(this.out);
                    tracing::debug!(
                        frames = this.transcoder.frames_emitted(),
                        "upstream stream ended"
                    );
                    *this.done = true;
                }
            }
            if !this.out.is_empty() {
                return Poll::Ready(Some(Ok(this.out.split().freeze())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn run(mode: ReasoningMode, chunks: &[&[u8]]) -> String {
        let mut transcoder = FrameTranscoder::new(mode);
        let mut out = BytesMut::new();
        for chunk in chunks {
            transcoder.push_chunk(chunk, &mut out);
        }
        transcoder.finish(&mut out);
        String::from_utf8(out.to_vec()).unwrap()
    }

    fn frames(output: &str) -> Vec<Value> {
        output
            .split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .filter(|payload| *payload != "[DONE]")
            .map(|payload| serde_json::from_str(payload).unwrap())
            .collect()
    }

    fn delta_line(reasoning: Option<&str>, content: Option<&str>) -> String {
        let mut delta = Map::new();
        if let Some(r) = reasoning {
            delta.insert(REASONING_FIELD.into(), Value::String(r.into()));
        }
        if let Some(c) = content {
            delta.insert("content".into(), Value::String(c.into()));
        }
        let frame = serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "m",
            "choices": [{"index": 0, "delta": delta, "finish_reason": null}],
        });
        format!("data: {frame}\n\n")
    }

    fn contents(output: &str) -> String {
        frames(output)
            .iter()
            .filter_map(|f| f["choices"][0]["delta"]["content"].as_str().map(str::to_owned))
            .collect()
    }

    #[test]
    fn test_merge_delta_transitions() {
        let (state, text) = merge_delta(ChannelState::Open, Some("a"), None);
        assert_eq!((state, text.as_str()), (ChannelState::ReasoningOpen, "<think>\na"));

        let (state, text) = merge_delta(state, Some("b"), None);
        assert_eq!((state, text.as_str()), (ChannelState::ReasoningOpen, "b"));

        let (state, text) = merge_delta(state, None, Some("X"));
        assert_eq!((state, text.as_str()), (ChannelState::Open, "</think>\n\nX"));

        let (state, text) = merge_delta(state, Some(""), Some(""));
        assert_eq!((state, text.as_str()), (ChannelState::Open, ""));
    }

    #[test]
    fn test_merge_delta_both_in_one_frame() {
        let (state, text) = merge_delta(ChannelState::Open, Some("r"), Some("c"));
        assert_eq!(state, ChannelState::Open);
        assert_eq!(text, "<think>\nr</think>\n\nc");
    }

    #[test]
    fn test_merge_mode_stream() {
        let input = [
            delta_line(Some("step 1"), None),
            delta_line(Some(" step 2"), None),
            delta_line(None, Some("Answer")),
            delta_line(None, Some(".")),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        let output = run(ReasoningMode::Merge, &[input.as_bytes()]);

        assert_eq!(contents(&output), "<think>\nstep 1 step 2</think>\n\nAnswer.");
        assert!(!output.contains(REASONING_FIELD));
        assert!(output.ends_with("data: [DONE]\n\n"));
    }

    #[test]
    fn test_suppress_mode_stream() {
        let input = [
            delta_line(Some("hidden"), None),
            delta_line(None, Some("Hi")),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        let output = run(ReasoningMode::Suppress, &[input.as_bytes()]);
        let parsed = frames(&output);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["choices"][0]["delta"]["content"], "");
        assert_eq!(parsed[1]["choices"][0]["delta"]["content"], "Hi");
        assert!(!output.contains("hidden"));
        assert!(!output.contains("<think>"));
    }

    #[test]
    fn test_suppress_mode_null_content_becomes_empty() {
        let line = "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":null}}]}\n\n";
        let output = run(ReasoningMode::Suppress, &[line.as_bytes()]);
        let parsed = frames(&output);
        assert_eq!(parsed[0]["choices"][0]["delta"]["content"], "");
        assert_eq!(parsed[0]["choices"][0]["delta"]["role"], "assistant");
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_output() {
        let input = [
            delta_line(Some("思考 ü"), None),
            ": keep-alive\n".to_string(),
            delta_line(None, Some("résumé")),
            "data: [DONE]\r\n\r\n".to_string(),
        ]
        .concat();
        let bytes = input.as_bytes();
        let whole = run(ReasoningMode::Merge, &[bytes]);

        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(run(ReasoningMode::Merge, &singles), whole);

        for split in [3, 7, 17, bytes.len() / 2, bytes.len() - 1] {
            let (a, b) = bytes.split_at(split);
            assert_eq!(run(ReasoningMode::Merge, &[a, b]), whole, "split at {split}");
        }
    }

    #[test]
    fn test_non_json_line_forwarded() {
        let output = run(
            ReasoningMode::Merge,
            &[b"data: not json\n\nevent: ping\n: comment\ndata: [DONE]\n\n"],
        );
        assert_eq!(
            output,
            "data: not json\n\nevent: ping\n: comment\ndata: [DONE]\n\n"
        );
    }

    #[test]
    fn test_malformed_line_then_frames_still_merged() {
        let input = [
            "data: {not valid json\n\n".to_string(),
            delta_line(Some("r"), None),
            delta_line(None, Some("c")),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        let output = run(ReasoningMode::Merge, &[input.as_bytes()]);

        let (bad, rest) = output.split_once("\n\n").unwrap();
        assert_eq!(bad, "data: {not valid json");
        assert_eq!(contents(rest), "<think>\nr</think>\n\nc");
        assert!(rest.ends_with("data: [DONE]\n\n"));
    }

    #[test]
    fn test_malformed_crlf_line_keeps_its_bytes() {
        let output = run(
            ReasoningMode::Merge,
            &[b"data: {not valid json\r\n\r\n: ping\r\n"],
        );
        assert_eq!(output, "data: {not valid json\r\n\n: ping\n");
    }

    #[test]
    fn test_done_closes_open_reasoning() {
        let input = [
            delta_line(Some("thinking"), None),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        let output = run(ReasoningMode::Merge, &[input.as_bytes()]);
        let parsed = frames(&output);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["id"], "cmpl-1");
        assert_eq!(parsed[1]["choices"][0]["delta"]["content"], REASONING_CLOSE);
        assert!(output.ends_with("data: [DONE]\n\n"));
        assert_eq!(contents(&output), "<think>\nthinking</think>\n\n");
    }

    #[test]
    fn test_finish_closes_open_reasoning_without_done() {
        let input = delta_line(Some("thinking"), None);
        let output = run(ReasoningMode::Merge, &[input.as_bytes(), b"data: {\"trunc"]);
        assert_eq!(contents(&output), "<think>\nthinking</think>\n\n");
        assert!(!output.contains("trunc"));
    }

    #[test]
    fn test_frame_without_delta_passes_through() {
        let line = "data: {\"id\":\"x\",\"choices\":[{\"index\":0,\"finish_reason\":\"stop\"}],\"usage\":{\"total_tokens\":3}}\n\n";
        let output = run(ReasoningMode::Merge, &[line.as_bytes()]);
        assert_eq!(output, line);
    }

    #[tokio::test]
    async fn test_stream_adapter_ends_on_upstream_error() {
        let first = delta_line(None, Some("ok"));
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from(first.clone())),
            Ok(Bytes::from_static(b"data: {\"partial")),
            Err("connection reset".to_string()),
            Ok(Bytes::from(delta_line(None, Some("never")))),
        ];
        let stream = TranscodeStream::new(futures_util::stream::iter(chunks), ReasoningMode::Merge);
        let collected: Vec<Bytes> = stream.map(|item| item.unwrap()).collect().await;
        let output: String = collected
            .iter()
            .map(|b| std::str::from_utf8(b).unwrap())
            .collect();

        assert_eq!(contents(&output), "ok");
        assert!(!output.contains("never"));
        assert!(!output.contains("partial"));
    }

    #[tokio::test]
    async fn test_stream_adapter_flushes_close_at_end() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from(delta_line(Some("r"), None)))];
        let stream = TranscodeStream::new(futures_util::stream::iter(chunks), ReasoningMode::Merge);
        let collected: Vec<Bytes> = stream.map(|item| item.unwrap()).collect().await;
        let output: String = collected
            .iter()
            .map(|b| std::str::from_utf8(b).unwrap())
            .collect();
        assert_eq!(contents(&output), "<think>\nr</think>\n\n");
    }
}
