//! Dual push/REST mutation paths.
//!
//! Every outbound mutation has a push-with-ack path and a REST fallback
//! conforming to the same result contract. [`DualPathSender`] picks at call
//! time: the realtime path when the transport reports connected, REST on
//! transport absence or ack failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::types;
use super::PushTransport;
use crate::api::{ChatApi, NewMessage};
use crate::error::ChatError;
use crate::models::{ConversationKind, Message, Reaction};

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Capability check; an unavailable sender is skipped at call time
    fn is_available(&self) -> bool;

    async fn send(&self, draft: &NewMessage) -> Result<Message, ChatError>;

    async fn edit(&self, id: &str, body: &str) -> Result<Message, ChatError>;

    async fn delete(&self, id: &str) -> Result<(), ChatError>;

    async fn react(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError>;
}

/// Push-socket sender: emits named events and decodes the ack payload.
pub struct RealtimeSender {
    transport: Arc<dyn PushTransport>,
    kind: ConversationKind,
}

impl RealtimeSender {
    pub fn new(transport: Arc<dyn PushTransport>, kind: ConversationKind) -> Self {
        Self { transport, kind }
    }

    fn decode_message(ack: serde_json::Value) -> Result<Message, ChatError> {
        let message: Message = serde_json::from_value(ack)
            .map_err(|e| ChatError::Data(format!("bad ack payload: {e}")))?;
        if message.id.is_empty() {
            return Err(ChatError::Data("ack payload missing id".to_string()));
        }
        Ok(message)
    }
}

#[async_trait]
impl MessageSender for RealtimeSender {
    fn is_available(&self) -> bool {
        self.transport.is_connected()
    }

    async fn send(&self, draft: &NewMessage) -> Result<Message, ChatError> {
        let payload = serde_json::to_value(draft)
            .map_err(|e| ChatError::Data(format!("unserializable draft: {e}")))?;
        let ack = self
            .transport
            .emit_with_ack(types::send_event(self.kind), payload)
            .await?;
        Self::decode_message(ack)
    }

    async fn edit(&self, id: &str, body: &str) -> Result<Message, ChatError> {
        let ack = self
            .transport
            .emit_with_ack(
                types::edit_event(self.kind),
                json!({ "messageId": id, "body": body }),
            )
            .await?;
        Self::decode_message(ack)
    }

    async fn delete(&self, id: &str) -> Result<(), ChatError> {
        self.transport
            .emit_with_ack(types::delete_event(self.kind), json!({ "messageId": id }))
            .await?;
        Ok(())
    }

    async fn react(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError> {
        let ack = self
            .transport
            .emit_with_ack(
                types::react_event(self.kind),
                json!({ "messageId": id, "emoji": emoji }),
            )
            .await?;
        serde_json::from_value(ack).map_err(|e| ChatError::Data(format!("bad ack payload: {e}")))
    }
}

/// REST fallback sender - always available.
pub struct RestSender {
    api: Arc<dyn ChatApi>,
}

impl RestSender {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MessageSender for RestSender {
    fn is_available(&self) -> bool {
        true
    }

    async fn send(&self, draft: &NewMessage) -> Result<Message, ChatError> {
        self.api.create_message(draft).await
    }

    async fn edit(&self, id: &str, body: &str) -> Result<Message, ChatError> {
        self.api.update_message(id, body).await
    }

    async fn delete(&self, id: &str) -> Result<(), ChatError> {
        self.api.delete_message(id).await
    }

    async fn react(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError> {
        self.api.react_message(id, emoji).await
    }
}

/// Call-time dispatcher over the two paths. The realtime path is preferred
/// when available; any realtime failure falls back to REST, whose error (if
/// any) is the one surfaced.
pub struct DualPathSender {
    realtime: Option<RealtimeSender>,
    rest: RestSender,
}

impl DualPathSender {
    pub fn new(
        api: Arc<dyn ChatApi>,
        transport: Option<Arc<dyn PushTransport>>,
        kind: ConversationKind,
    ) -> Self {
        Self {
            realtime: transport.map(|t| RealtimeSender::new(t, kind)),
            rest: RestSender::new(api),
        }
    }

    fn realtime_if_available(&self) -> Option<&RealtimeSender> {
        self.realtime.as_ref().filter(|rt| rt.is_available())
    }

    pub async fn send(&self, draft: &NewMessage) -> Result<Message, ChatError> {
        if let Some(rt) = self.realtime_if_available() {
            match rt.send(draft).await {
                Ok(message) => return Ok(message),
                Err(e) => tracing::warn!("push send failed, falling back to REST: {e}"),
            }
        }
        self.rest.send(draft).await
    }

    pub async fn edit(&self, id: &str, body: &str) -> Result<Message, ChatError> {
        if let Some(rt) = self.realtime_if_available() {
            match rt.edit(id, body).await {
                Ok(message) => return Ok(message),
                Err(e) => tracing::warn!("push edit failed, falling back to REST: {e}"),
            }
        }
        self.rest.edit(id, body).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ChatError> {
        if let Some(rt) = self.realtime_if_available() {
            match rt.delete(id).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!("push delete failed, falling back to REST: {e}"),
            }
        }
        self.rest.delete(id).await
    }

    pub async fn react(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError> {
        if let Some(rt) = self.realtime_if_available() {
            match rt.react(id, emoji).await {
                Ok(reactions) => return Ok(reactions),
                Err(e) => tracing::warn!("push react failed, falling back to REST: {e}"),
            }
        }
        self.rest.react(id, emoji).await
    }
}
