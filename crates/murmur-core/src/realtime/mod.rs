//! Push transport seam.
//!
//! The socket implementation itself is an external collaborator; this module
//! holds the trait the engine talks through, the inbound event types, and the
//! channel plumbing that delivers events into the session loop.

pub mod sender;
pub mod types;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;

pub use sender::{DualPathSender, MessageSender, RealtimeSender, RestSender};
pub use types::{events, PushEvent};

/// Bidirectional push channel, authenticated by a token at connect time
/// (outside this crate). Emits are fire-with-acknowledgement: the returned
/// JSON is the server's canonical result for the action.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Capability check consulted at call time for the push/REST choice
    fn is_connected(&self) -> bool;

    /// Emit a named event and wait for its acknowledgement payload. An
    /// absent, failed, or timed-out ack surfaces as [`ChatError::Transport`].
    async fn emit_with_ack(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError>;
}

/// Channel pair carrying inbound push events into the session's event loop.
/// The transport side keeps the sender; the app loop drains the receiver and
/// feeds [`crate::ChatSession::handle_push_event`].
pub fn push_event_channel(capacity: usize) -> (mpsc::Sender<PushEvent>, mpsc::Receiver<PushEvent>) {
    mpsc::channel(capacity)
}
