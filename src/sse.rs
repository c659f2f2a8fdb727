//! Server-Sent Events framing.
//!
//! The endpoint answers with frames of the form:
//!
//! ```text
//! event: message
//! data: {"text":"Hi"}
//!
//! event: message
//! data: {"text":" there"}
//!
//! ```
//!
//! Two layers handle this:
//!
//! - [`SseFrameParser`] is the line-level state machine. It is `Idle` until an `event:` or
//!   `data:` line arrives, `Collecting` afterwards, and a blank line flushes it back to `Idle`.
//!   A flush emits a frame only when both the event name and the payload are non-empty;
//!   anything else (keep-alives, half frames) is dropped silently. Repeated `event:` or
//!   `data:` lines overwrite each other; multi-line data continuation is not supported.
//! - [`FrameReader`] turns the raw response [`ByteStream`] into lines, feeds the parser, and
//!   yields frames in wire order. Transport read failures end the reader with that error;
//!   a clean end of stream simply ends it.

use crate::transport::ByteStream;
use crate::{Error, Result};
use futures::stream::{Stream, StreamExt};
use std::collections::VecDeque;

/// Longest line accepted from the wire before the stream is treated as malformed.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One `(event, data)` pair delimited by a blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Line-level SSE state machine.
#[derive(Debug, Default)]
pub struct SseFrameParser {
    event: String,
    data: String,
    collecting: bool,
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once an `event:` or `data:` line has been seen since the last flush.
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Feeds one line (without its terminator). Returns a frame when the line is the blank
    /// line that completes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.flush();
        }

        if let Some(value) = line.strip_prefix("event:") {
            self.event = value.trim().to_string();
            self.collecting = true;
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data = value.trim().to_string();
            self.collecting = true;
        }
        // comments, id:, retry: and unknown fields are ignored

        None
    }

    fn flush(&mut self) -> Option<SseFrame> {
        self.collecting = false;
        let event = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data);

        if event.is_empty() || data.is_empty() {
            return None;
        }
        Some(SseFrame { event, data })
    }
}

/// Reads SSE frames from a response body.
pub struct FrameReader {
    body: ByteStream,
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    parser: SseFrameParser,
    ready: VecDeque<SseFrame>,
    finished: bool,
}

impl FrameReader {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            scanned: 0,
            parser: SseFrameParser::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Returns the next complete frame, `Some(Err(_))` once on a read failure, or `None`
    /// when the stream is exhausted.
    pub async fn next_frame(&mut self) -> Option<Result<SseFrame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Some(Ok(frame));
            }
            if self.finished {
                return None;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    if let Err(e) = self.feed(&chunk) {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    self.finish();
                }
            }
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        let mut from = self.scanned;
        while let Some(pos) = self.buffer[from..].iter().position(|&b| b == b'\n') {
            let end = from + pos;
            // Whole lines only, so multi-byte characters are never split.
            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            if let Some(frame) = self.parser.push_line(&line) {
                log::trace!(
                    "SSE frame: event={} ({} bytes)",
                    frame.event,
                    frame.data.len()
                );
                self.ready.push_back(frame);
            }
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            return Err(Error::stream(format!(
                "SSE line exceeds {} bytes",
                MAX_LINE_BYTES
            )));
        }
        Ok(())
    }

    fn finish(&mut self) {
        // A trailing line without a newline is still a line, but without a blank line after
        // it the pending frame is never flushed.
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            self.scanned = 0;
            if let Some(frame) = self.parser.push_line(&line) {
                self.ready.push_back(frame);
            }
        }
        if self.parser.is_collecting() {
            log::debug!("Discarding unterminated SSE frame at end of stream");
        }
    }
}

/// Exposes a response body as a stream of frames.
pub fn sse_frames(body: ByteStream) -> impl Stream<Item = Result<SseFrame>> + Send {
    futures::stream::unfold(FrameReader::new(body), |mut reader| async move {
        reader.next_frame().await.map(|item| (item, reader))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn body(chunks: Vec<&'static str>) -> ByteStream {
        Box::pin(futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, Error>(Bytes::from_static(c.as_bytes()))),
        ))
    }

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<SseFrame>> {
        sse_frames(body(chunks)).collect().await
    }

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_parser_emits_on_blank_line() {
        let mut parser = SseFrameParser::new();
        assert!(!parser.is_collecting());
        assert_eq!(parser.push_line("event: message"), None);
        assert!(parser.is_collecting());
        assert_eq!(parser.push_line("data: {\"text\":\"Hi\"}"), None);
        assert_eq!(
            parser.push_line(""),
            Some(frame("message", "{\"text\":\"Hi\"}"))
        );
        assert!(!parser.is_collecting());
    }

    #[test]
    fn test_parser_last_write_wins() {
        let mut parser = SseFrameParser::new();
        parser.push_line("event: first");
        parser.push_line("event: second");
        parser.push_line("data: 1");
        parser.push_line("data: 2");
        assert_eq!(parser.push_line(""), Some(frame("second", "2")));
    }

    #[test]
    fn test_parser_discards_partial_frames() {
        let mut parser = SseFrameParser::new();
        parser.push_line("event: ping");
        assert_eq!(parser.push_line(""), None);

        // the discarded event name must not leak into the next frame
        parser.push_line("data: {}");
        assert_eq!(parser.push_line(""), None);

        assert_eq!(parser.push_line(""), None);
    }

    #[test]
    fn test_parser_ignores_other_fields_and_crlf() {
        let mut parser = SseFrameParser::new();
        assert_eq!(parser.push_line(": keep-alive"), None);
        assert!(!parser.is_collecting());
        parser.push_line("id: 42\r");
        parser.push_line("retry: 1000\r");
        parser.push_line("event:message\r");
        parser.push_line("data:{}\r");
        assert_eq!(parser.push_line("\r"), Some(frame("message", "{}")));
    }

    #[tokio::test]
    async fn test_frames_preserve_order() {
        let frames = collect(vec![
            "event: message\ndata: {\"text\":\"a\"}\n\n",
            "event: message\ndata: {\"text\":\"b\"}\n\nevent: functionHit\n",
            "data: {\"n\":1}\n\n",
        ])
        .await;

        let frames: Vec<SseFrame> = frames.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(
            frames,
            vec![
                frame("message", "{\"text\":\"a\"}"),
                frame("message", "{\"text\":\"b\"}"),
                frame("functionHit", "{\"n\":1}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let frames = collect(vec!["ev", "ent: mess", "age\nda", "ta: {\"text\":\"", "Привет\"}\n", "\n"])
            .await;
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].as_ref().unwrap(),
            &frame("message", "{\"text\":\"Привет\"}")
        );
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let text = "event: message\ndata: {\"text\":\"é\"}\n\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::copy_from_slice(&text[..split])),
            Ok(Bytes::copy_from_slice(&text[split..])),
        ];
        let frames: Vec<_> = sse_frames(Box::pin(futures::stream::iter(chunks)))
            .collect()
            .await;
        assert_eq!(
            frames[0].as_ref().unwrap(),
            &frame("message", "{\"text\":\"é\"}")
        );
    }

    #[tokio::test]
    async fn test_long_line_in_small_chunks() {
        let text = "x".repeat(64 * 1024);
        let payload = format!("event: message\ndata: {{\"text\":\"{}\"}}\n\n", text);
        let chunks: Vec<Result<Bytes>> = payload
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let frames: Vec<_> = sse_frames(Box::pin(futures::stream::iter(chunks)))
            .collect()
            .await;
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].as_ref().unwrap().data,
            format!("{{\"text\":\"{}\"}}", text)
        );
    }

    #[test]
    fn test_feed_resumes_newline_search() {
        let mut reader = FrameReader::new(body(Vec::new()));
        reader.feed(b"event: mes").unwrap();
        assert_eq!(reader.scanned, 10);
        reader.feed(b"sage\ndata: {\"te").unwrap();
        // only the partial data line is left, and all of it has been searched
        assert_eq!(reader.buffer, b"data: {\"te");
        assert_eq!(reader.scanned, reader.buffer.len());
        reader.feed(b"xt\":\"a\"}\n\n").unwrap();
        assert_eq!(reader.scanned, 0);
        assert_eq!(
            reader.ready.pop_front(),
            Some(frame("message", "{\"text\":\"a\"}"))
        );
    }

    #[tokio::test]
    async fn test_unterminated_frame_is_dropped() {
        let frames = collect(vec![
            "event: message\ndata: {\"text\":\"a\"}\n\n",
            "event: message\ndata: {\"text\":\"b\"}",
        ])
        .await;
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_stream_ends_silently() {
        assert!(collect(Vec::new()).await.is_empty());
        assert!(collect(vec!["\n\n: comment\n\n"]).await.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_is_terminal() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"event: message\ndata: {\"text\":\"a\"}\n\n")),
            Err(Error::stream("connection reset")),
            Ok(Bytes::from_static(b"event: message\ndata: {\"text\":\"b\"}\n\n")),
        ];
        let frames: Vec<_> = sse_frames(Box::pin(futures::stream::iter(chunks)))
            .collect()
            .await;

        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(Error::Stream(_))));
    }

    #[tokio::test]
    async fn test_oversized_line_is_an_error() {
        let long = "x".repeat(MAX_LINE_BYTES + 1);
        let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from(long))];
        let frames: Vec<_> = sse_frames(Box::pin(futures::stream::iter(chunks)))
            .collect()
            .await;
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(Error::Stream(_))));
    }
}
