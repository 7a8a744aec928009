//! Status sink: the one-way channel the engine uses to tell the outside
//! world (a GUI, or in this crate's binary, the log) what happened.
//!
//! Kept deliberately simple — a string channel, per the contract an external
//! GUI would consume — rather than a richer structured event enum, since the
//! only required consumer here is `tracing`.

use tokio::sync::mpsc;
use tracing::info;

#[derive(Clone)]
pub struct StatusSink {
    tx: mpsc::UnboundedSender<String>,
}

impl StatusSink {
    /// Create a sink paired with a receiver the caller is responsible for
    /// draining (e.g. by forwarding every message to `tracing`).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish a status line. Never blocks; drops silently if the receiver
    /// has been dropped (nobody is listening, which is not an engine error).
    pub fn publish(&self, message: impl Into<String>) {
        let _ = self.tx.send(message.into());
    }
}

/// Drain a status receiver onto `tracing::info!` until the sender side is
/// dropped. Intended to be spawned as its own task by the binary entry
/// point — the thin, non-GUI consumer of the status channel.
pub async fn forward_to_log(mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        info!(target: "status", "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_messages_are_received_in_order() {
        let (sink, mut rx) = StatusSink::new();
        sink.publish("first");
        sink.publish("second");
        drop(sink);
        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(rx.recv().await.as_deref(), Some("second"));
        assert_eq!(rx.recv().await, None);
    }
}
