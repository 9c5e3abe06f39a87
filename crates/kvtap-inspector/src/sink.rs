//! Display sinks
//!
//! A [`DisplaySink`] receives every [`DisplayMessage`] the inspector
//! produces. Delivery is fire-and-forget: sinks never report failure back
//! to the storage engine.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::message::DisplayMessage;

/// Destination for display messages
pub trait DisplaySink: Send + Sync {
    fn display(&self, message: DisplayMessage);
}

impl<S: DisplaySink + ?Sized> DisplaySink for Arc<S> {
    fn display(&self, message: DisplayMessage) {
        (**self).display(message)
    }
}

/// Sink backed by a closure
pub struct FnSink<F>(pub F);

impl<F> DisplaySink for FnSink<F>
where
    F: Fn(DisplayMessage) + Send + Sync,
{
    fn display(&self, message: DisplayMessage) {
        (self.0)(message)
    }
}

/// Sink that logs every message through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DisplaySink for TracingSink {
    fn display(&self, message: DisplayMessage) {
        info!(
            target: "kvtap::display",
            name = %message.name,
            value = %message.value,
            "{}",
            message.preview
        );
    }
}

/// Sink that forwards messages into an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DisplayMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<DisplayMessage>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl DisplaySink for ChannelSink {
    fn display(&self, message: DisplayMessage) {
        if let Err(err) = self.tx.send(message) {
            trace!(preview = %err.0.preview, "Display receiver closed, dropping message");
        }
    }
}

/// Command envelope written by [`JsonlSink`]
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    date: String,
    payload: &'a DisplayMessage,
}

/// Sink that writes one JSON line per message
///
/// Each line is a `display` command:
/// `{"type":"display","date":"...","payload":{"name":..,"value":..,"preview":..}}`.
/// Write failures are logged and the message is dropped.
#[derive(Debug)]
pub struct JsonlSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, message: &DisplayMessage) -> std::io::Result<()> {
        let envelope = Envelope {
            kind: "display",
            date: Utc::now().to_rfc3339(),
            payload: message,
        };
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, &envelope)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl<W: Write + Send> DisplaySink for JsonlSink<W> {
    fn display(&self, message: DisplayMessage) {
        if let Err(err) = self.write_line(&message) {
            warn!(error = %err, preview = %message.preview, "Failed to write display message");
        }
    }
}
