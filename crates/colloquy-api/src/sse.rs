//! Server-Sent-Events line decoder.
//!
//! Chat-completion streams arrive as `data: <json>` lines terminated by a
//! literal `data: [DONE]` line. The decoder is fed raw chunks and keeps a
//! residual buffer so frames split across chunk boundaries reassemble.

/// One decoded line of interest from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// The JSON payload of a `data:` line.
    Data(String),
    /// The literal `[DONE]` terminator.
    Done,
}

/// Incremental decoder for `data:`-prefixed event-stream lines.
pub struct SseLineDecoder {
    buffer: String,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feed a chunk of text and return any complete lines.
    ///
    /// Blank lines and lines without the `data:` prefix are skipped; the
    /// remainder of a partial line stays buffered for the next feed.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseLine> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);

            if let Some(decoded) = Self::decode_line(&line) {
                lines.push(decoded);
            }
        }

        lines
    }

    fn decode_line(line: &str) -> Option<SseLine> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let payload = line.strip_prefix("data:")?;
        let payload = payload.strip_prefix(' ').unwrap_or(payload);

        if payload == "[DONE]" {
            Some(SseLine::Done)
        } else {
            Some(SseLine::Data(payload.to_string()))
        }
    }
}

impl Default for SseLineDecoder {
    fn default() -> Self {
        Self::new()
    }
}
