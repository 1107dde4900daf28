//! Transport ports and adapters.
//!
//! The dispatcher only sees [`InboundPort`] and [`OutboundPort`]. Adapters
//! exist for in-process channels and for a line-delimited JSON bridge over
//! any async reader/writer pair (stdin/stdout in `lastmile serve`):
//!
//! ```text
//! in:  {"chat_id":"-100123","type":"location","latitude":12.345,"longitude":67.89}
//! in:  {"chat_id":"-100123","type":"text","text":"12.345,67.890"}
//! out: {"chat_id":"-100123","message":"Location: 12.345, 67.89\n..."}
//! ```

use async_trait::async_trait;
use lastmile_core::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// A message from a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Chat the message came from
    pub chat_id: String,
    /// What was sent
    #[serde(flatten)]
    pub payload: Payload,
}

impl InboundMessage {
    /// Shared location
    pub fn location(chat_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            chat_id: chat_id.into(),
            payload: Payload::Location { latitude, longitude },
        }
    }

    /// Free text
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            payload: Payload::Text { text: text.into() },
        }
    }
}

/// Inbound message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    /// A location shared through the platform
    Location {
        /// Degrees north
        latitude: f64,
        /// Degrees east
        longitude: f64,
    },
    /// Anything typed
    Text {
        /// Message body
        text: String,
    },
}

/// A reply to a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Chat to reply to
    pub chat_id: String,
    /// Reply body
    #[serde(rename = "message")]
    pub text: String,
}

impl OutboundMessage {
    /// Reply to `chat_id`
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}

/// Source of inbound messages.
#[async_trait]
pub trait InboundPort: Send {
    /// Next message, or `None` once the transport is closed
    async fn recv(&mut self) -> Option<InboundMessage>;
}

/// Sink for replies.
#[async_trait]
pub trait OutboundPort: Send + Sync {
    /// Deliver one reply
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// Inbound side of an in-process channel.
pub struct ChannelInbound {
    rx: mpsc::Receiver<InboundMessage>,
}

impl ChannelInbound {
    /// Wrap a receiver
    pub fn new(rx: mpsc::Receiver<InboundMessage>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl InboundPort for ChannelInbound {
    async fn recv(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}

/// Outbound side of an in-process channel.
#[derive(Clone)]
pub struct ChannelOutbound {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelOutbound {
    /// Wrap a sender
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl OutboundPort for ChannelOutbound {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| Error::new(ErrorCode::ChannelClosed, "outbound channel closed"))
    }
}

/// In-process ports plus the channel ends a test or host drives them with.
pub struct MemoryPorts {
    /// Feed inbound messages here
    pub inbox: mpsc::Sender<InboundMessage>,
    /// Port handed to the dispatcher
    pub inbound: ChannelInbound,
    /// Port handed to the dispatcher
    pub outbound: ChannelOutbound,
    /// Replies come out here
    pub outbox: mpsc::Receiver<OutboundMessage>,
}

/// Create a pair of bounded in-process channels wired as ports.
pub fn memory_ports(buffer: usize) -> MemoryPorts {
    let (inbox, in_rx) = mpsc::channel(buffer);
    let (out_tx, outbox) = mpsc::channel(buffer);
    MemoryPorts {
        inbox,
        inbound: ChannelInbound::new(in_rx),
        outbound: ChannelOutbound::new(out_tx),
        outbox,
    }
}

/// Inbound JSON lines. Malformed lines, including ones that are not UTF-8,
/// are logged and skipped.
pub struct JsonLinesInbound<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> JsonLinesInbound<R> {
    /// Read messages from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InboundPort for JsonLinesInbound<R> {
    async fn recv(&mut self) -> Option<InboundMessage> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Inbound stream failed");
                    return None;
                }
            }
            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(code = %ErrorCode::MalformedInput, error = %e, "Skipping non-UTF-8 inbound line");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(message) => return Some(message),
                Err(e) => warn!(code = %ErrorCode::MalformedInput, error = %e, "Skipping malformed inbound line"),
            }
        }
    }
}

/// Outbound JSON lines, one flushed line per reply.
pub struct JsonLinesOutbound<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesOutbound<W> {
    /// Write replies to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> OutboundPort for JsonLinesOutbound<W> {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let mut line = serde_json::to_vec(&message)
            .map_err(|e| Error::send_failed("cannot encode reply").with_source(e))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| Error::send_failed(format!("cannot write reply for {}", message.chat_id)).with_source(e))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::send_failed("cannot flush replies").with_source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_wire_format() {
        let message: InboundMessage =
            serde_json::from_str(r#"{"chat_id":"-100","type":"location","latitude":12.345,"longitude":67.89}"#)
                .unwrap();
        assert_eq!(message, InboundMessage::location("-100", 12.345, 67.89));

        let message: InboundMessage =
            serde_json::from_str(r#"{"chat_id":"7","type":"text","text":"hi"}"#).unwrap();
        assert_eq!(message, InboundMessage::text("7", "hi"));

        let out = serde_json::to_value(OutboundMessage::new("7", "ok")).unwrap();
        assert_eq!(out, serde_json::json!({"chat_id": "7", "message": "ok"}));
    }

    #[tokio::test]
    async fn test_json_lines_skips_garbage() {
        let input = b"not json\n\n{\"chat_id\":\"1\",\"type\":\"text\",\"text\":\"a\"}\n{\"chat_id\":2}\n" as &[u8];
        let mut inbound = JsonLinesInbound::new(BufReader::new(input));
        assert_eq!(inbound.recv().await, Some(InboundMessage::text("1", "a")));
        assert_eq!(inbound.recv().await, None);
    }

    #[tokio::test]
    async fn test_json_lines_survives_invalid_utf8() {
        let mut input = br#"{"chat_id":"1","type":"text","text":"a"}"#.to_vec();
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"chat_id":"2","type":"text","text":"b"}"#);
        input.push(b'\n');

        let mut inbound = JsonLinesInbound::new(BufReader::new(input.as_slice()));
        assert_eq!(inbound.recv().await, Some(InboundMessage::text("1", "a")));
        assert_eq!(inbound.recv().await, Some(InboundMessage::text("2", "b")));
        assert_eq!(inbound.recv().await, None);
    }

    #[tokio::test]
    async fn test_json_lines_outbound() {
        let outbound = JsonLinesOutbound::new(Vec::new());
        outbound.send(OutboundMessage::new("1", "first\nline")).await.unwrap();
        outbound.send(OutboundMessage::new("2", "second")).await.unwrap();

        let written = String::from_utf8(outbound.into_inner()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: OutboundMessage = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.text, "first\nline");
    }

    #[tokio::test]
    async fn test_channel_closed() {
        let ports = memory_ports(1);
        drop(ports.outbox);
        let err = ports.outbound.send(OutboundMessage::new("1", "x")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ChannelClosed);
    }
}
