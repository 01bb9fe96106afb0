/// Event-stream line reassembly and frame encoding helpers.
///
/// Upstream bytes arrive in arbitrary chunks. [`LineBuffer`] keeps the
/// trailing partial line between chunks so a line is only handed out once
/// its `\n` has been seen. It works on raw bytes, so a multi-byte UTF-8
/// sequence split across chunks is reassembled intact.
use bytes::{BufMut, Bytes, BytesMut};
use memchr::{memchr, memchr_iter};
use smallvec::SmallVec;

/// Terminator written after every `data:` frame.
pub const FRAME_END: &[u8] = b"\n\n";
/// Longest partial line kept between chunks before it is dropped.
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;
const DATA_PREFIX: &[u8] = b"data:";
const DONE_PAYLOAD: &[u8] = b"[DONE]";

/// Carry-over buffer splitting a byte stream into complete lines.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    max_line: usize,
    /// Set after an oversized line was dropped; bytes are skipped up to the
    /// next `\n`.
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE_BYTES)
    }

    #[must_use]
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096.min(max_line)),
            max_line,
            discarding: false,
        }
    }

    /// Append `chunk` and push every now-complete line into `out`.
    ///
    /// Lines are yielded without their `\n`; a `\r` before it is kept (see
    /// [`trim_cr`]). The incomplete tail stays buffered unless it grows past
    /// the line limit, in which case the whole line is dropped.
    pub fn feed_into(&mut self, chunk: &[u8], out: &mut Vec<Bytes>) {
        let mut chunk = chunk;
        if self.discarding {
            let Some(pos) = memchr(b'\n', chunk) else {
                return;
            };
            chunk = &chunk[pos + 1..];
            self.discarding = false;
        }

        // The carry-over never contains '\n', so only the new bytes need scanning.
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let newlines: SmallVec<[usize; 16]> = memchr_iter(b'\n', &self.buffer[scan_from..])
            .map(|rel| scan_from + rel)
            .collect();

        let mut consumed = 0usize;
        for pos in newlines {
            let mut line = self.buffer.split_to(pos + 1 - consumed);
            consumed = pos + 1;
            line.truncate(line.len() - 1);
            out.push(line.freeze());
        }

        if self.buffer.len() > self.max_line {
            tracing::warn!(
                bytes = self.buffer.len(),
                limit = self.max_line,
                "dropping oversized event-stream line"
            );
            self.buffer.clear();
            self.discarding = true;
        }
    }

    /// Bytes received after the last newline.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop and return the incomplete tail.
    pub fn take_pending(&mut self) -> Bytes {
        self.discarding = false;
        self.buffer.split().freeze()
    }
}

/// `line` without a trailing `\r`.
#[must_use]
pub fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Payload of a `data:` line (one optional leading space stripped), or
/// `None` for any other line.
#[must_use]
pub fn data_payload(line: &[u8]) -> Option<&[u8]> {
    let value = line.strip_prefix(DATA_PREFIX)?;
    Some(value.strip_prefix(b" ").unwrap_or(value))
}

/// Whether a `data:` payload is the `[DONE]` sentinel.
#[must_use]
pub fn is_done_payload(payload: &[u8]) -> bool {
    payload.trim_ascii() == DONE_PAYLOAD
}

/// Write `data: <payload>\n\n`.
pub fn write_data_frame(out: &mut BytesMut, payload: &[u8]) {
    out.reserve(8 + payload.len());
    out.put_slice(b"data: ");
    out.put_slice(payload);
    out.put_slice(FRAME_END);
}

/// Write an upstream line verbatim followed by `terminator`.
pub fn write_raw_line(out: &mut BytesMut, line: &[u8], terminator: &[u8]) {
    out.reserve(line.len() + terminator.len());
    out.put_slice(line);
    out.put_slice(terminator);
}
