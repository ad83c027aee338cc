//! Server-sent event decoding for chat streams.
//!
//! The chat stream emits three named events:
//!
//! ```text
//! event: chunk    data: {"text": "..."}            (or "content")
//! event: final    data: {"mission_id", "mizzi_status", "files_generated"}
//! event: error    data: {"error", "error_code"}    (payload optional)
//! ```

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental decoder turning raw bytes into [`SseFrame`]s.
///
/// Bytes may be split anywhere, including inside a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every frame completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(text.as_ref());
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data);
        if event.is_empty() && data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: if event.is_empty() {
                "message".to_string()
            } else {
                event
            },
            data: data.join("\n"),
        })
    }
}

/// Payload of a terminal `final` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalEvent {
    #[serde(default)]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub mizzi_status: Option<String>,
    #[serde(default)]
    pub files_generated: Option<u32>,
}

/// Payload of a backend `error` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Decoded chat stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text
    Chunk(String),
    /// The reply is complete
    Final(FinalEvent),
    /// The backend reported a failure with a payload
    BackendError(StreamErrorPayload),
    /// The stream broke without a usable payload
    Disconnected(String),
}

impl StreamEvent {
    /// Interpret a frame; frames that carry nothing usable yield `None`.
    pub fn from_frame(frame: &SseFrame) -> Option<Self> {
        match frame.event.as_str() {
            "chunk" => {
                let payload: ChunkPayload = serde_json::from_str(&frame.data).ok()?;
                payload
                    .text
                    .filter(|t| !t.is_empty())
                    .or(payload.content.filter(|c| !c.is_empty()))
                    .map(Self::Chunk)
            }
            "final" => Some(Self::Final(
                serde_json::from_str(&frame.data).unwrap_or_default(),
            )),
            "error" => {
                if frame.data.trim().is_empty() {
                    return Some(Self::Disconnected("stream error event".to_string()));
                }
                match serde_json::from_str::<StreamErrorPayload>(&frame.data) {
                    Ok(payload) => Some(Self::BackendError(payload)),
                    Err(_) => Some(Self::Disconnected(frame.data.clone())),
                }
            }
            _ => None,
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk(_))
    }
}

/// A subscribed chat stream yielding [`StreamEvent`]s in arrival order.
///
/// After the first terminal event the stream is closed and yields nothing
/// more. A transport that ends without a terminal event yields a single
/// [`StreamEvent::Disconnected`].
pub struct ChatStream {
    bytes: BoxStream<'static, Result<Vec<u8>, String>>,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
    closed: bool,
}

impl ChatStream {
    /// Wrap a raw byte stream.
    pub fn from_bytes(bytes: BoxStream<'static, Result<Vec<u8>, String>>) -> Self {
        Self {
            bytes,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            closed: false,
        }
    }

    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(|e| e.to_string()))
            .boxed();
        Self::from_bytes(bytes)
    }

    /// Next decoded event, or `None` once closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.closed {
            return None;
        }

        loop {
            while let Some(frame) = self.pending.pop_front() {
                if let Some(event) = StreamEvent::from_frame(&frame) {
                    if event.is_terminal() {
                        self.close();
                    }
                    return Some(event);
                }
                debug!(event = %frame.event, "Ignoring stream frame");
            }

            match self.bytes.next().await {
                Some(Ok(bytes)) => self.pending.extend(self.decoder.push(&bytes)),
                Some(Err(e)) => {
                    self.close();
                    return Some(StreamEvent::Disconnected(e));
                }
                None => {
                    self.close();
                    return Some(StreamEvent::Disconnected(
                        "stream closed before final event".to_string(),
                    ));
                }
            }
        }
    }

    /// Drop the transport; further calls yield `None`.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
        self.bytes = stream::empty().boxed();
    }

    /// Adapt into a plain event stream.
    pub fn into_events(self) -> BoxStream<'static, StreamEvent> {
        stream::unfold(self, |mut s| async move {
            let event = s.next_event().await?;
            Some((event, s))
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(input: &str) -> Vec<SseFrame> {
        SseDecoder::new().push(input.as_bytes())
    }

    fn stream_of(parts: &[&str]) -> ChatStream {
        let chunks: Vec<Result<Vec<u8>, String>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        ChatStream::from_bytes(stream::iter(chunks).boxed())
    }

    #[test]
    fn test_decodes_named_events() {
        let out = frames("event: chunk\ndata: {\"text\":\"Hi\"}\n\nevent: final\ndata: {}\n\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].event, "chunk");
        assert_eq!(out[0].data, "{\"text\":\"Hi\"}");
        assert_eq!(out[1].event, "final");
    }

    #[test]
    fn test_split_across_pushes_and_crlf() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ch").is_empty());
        assert!(decoder.push(b"unk\r\ndata: {\"content\":").is_empty());
        let out = decoder.push(b"\"x\"}\r\n\r\n");
        assert_eq!(out, vec![SseFrame {
            event: "chunk".into(),
            data: "{\"content\":\"x\"}".into()
        }]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let out = frames(": keep-alive\ndata: a\ndata: b\n\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event, "message");
        assert_eq!(out[0].data, "a\nb");
    }

    #[test]
    fn test_event_interpretation() {
        let chunk = SseFrame { event: "chunk".into(), data: r#"{"content":"abc"}"#.into() };
        assert_eq!(StreamEvent::from_frame(&chunk), Some(StreamEvent::Chunk("abc".into())));

        let empty = SseFrame { event: "chunk".into(), data: r#"{"text":""}"#.into() };
        assert_eq!(StreamEvent::from_frame(&empty), None);

        let backend = SseFrame {
            event: "error".into(),
            data: r#"{"error":"quota","error_code":"RATE_LIMIT"}"#.into(),
        };
        assert!(matches!(
            StreamEvent::from_frame(&backend),
            Some(StreamEvent::BackendError(StreamErrorPayload { error: Some(_), .. }))
        ));

        let raw = SseFrame { event: "error".into(), data: "oops".into() };
        assert!(matches!(StreamEvent::from_frame(&raw), Some(StreamEvent::Disconnected(_))));

        let ping = SseFrame { event: "ping".into(), data: String::new() };
        assert_eq!(StreamEvent::from_frame(&ping), None);
    }

    #[tokio::test]
    async fn test_stream_closes_after_final() {
        let mut stream = stream_of(&[
            "event: chunk\ndata: {\"text\":\"Hel\"}\n\n",
            "event: chunk\ndata: {\"text\":\"lo\"}\n\nevent: final\ndata: {\"mizzi_status\":\"passed\"}\n\n",
            "event: chunk\ndata: {\"text\":\"late\"}\n\n",
        ]);

        assert_eq!(stream.next_event().await, Some(StreamEvent::Chunk("Hel".into())));
        assert_eq!(stream.next_event().await, Some(StreamEvent::Chunk("lo".into())));
        match stream.next_event().await {
            Some(StreamEvent::Final(f)) => assert_eq!(f.mizzi_status.as_deref(), Some("passed")),
            other => panic!("expected final, got {:?}", other),
        }
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_eof_without_final_is_disconnect() {
        let mut stream = stream_of(&["event: chunk\ndata: {\"text\":\"partial\"}\n\n"]);
        assert_eq!(stream.next_event().await, Some(StreamEvent::Chunk("partial".into())));
        assert!(matches!(stream.next_event().await, Some(StreamEvent::Disconnected(_))));
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_transport_error_is_disconnect() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Err("reset by peer".into())];
        let mut stream = ChatStream::from_bytes(stream::iter(chunks).boxed());
        assert_eq!(
            stream.next_event().await,
            Some(StreamEvent::Disconnected("reset by peer".into()))
        );
    }
}
