use serde::Deserialize;

use crate::models::{ConversationKind, Message};

/// Named events on the push socket. Channels and DMs use parallel event
/// families with identical payloads.
pub mod events {
    // Inbound
    pub const RECEIVE_MESSAGE: &str = "receive-message";
    pub const MESSAGE_EDITED: &str = "message-edited";
    pub const MESSAGE_DELETED: &str = "message-deleted";
    pub const MESSAGE_REACTION: &str = "message-reaction";
    pub const RECEIVE_DM: &str = "receive-dm";
    pub const DM_EDITED: &str = "dm-edited";
    pub const DM_DELETED: &str = "dm-deleted";
    pub const DM_REACTION: &str = "dm-reaction";

    // Outbound (emit-with-ack)
    pub const SEND_MESSAGE: &str = "send-message";
    pub const EDIT_MESSAGE: &str = "edit-message";
    pub const DELETE_MESSAGE: &str = "delete-message";
    pub const REACT_MESSAGE: &str = "react-message";
    pub const SEND_DM: &str = "send-dm";
    pub const EDIT_DM: &str = "edit-dm";
    pub const DELETE_DM: &str = "delete-dm";
    pub const REACT_DM: &str = "react-dm";
}

pub fn send_event(kind: ConversationKind) -> &'static str {
    if kind.is_dm() {
        events::SEND_DM
    } else {
        events::SEND_MESSAGE
    }
}

pub fn edit_event(kind: ConversationKind) -> &'static str {
    if kind.is_dm() {
        events::EDIT_DM
    } else {
        events::EDIT_MESSAGE
    }
}

pub fn delete_event(kind: ConversationKind) -> &'static str {
    if kind.is_dm() {
        events::DELETE_DM
    } else {
        events::DELETE_MESSAGE
    }
}

pub fn react_event(kind: ConversationKind) -> &'static str {
    if kind.is_dm() {
        events::REACT_DM
    } else {
        events::REACT_MESSAGE
    }
}

/// Inbound push event, decoded straight from a raw `{event, data}` frame.
/// Variant tags are the wire names in [`events`]; the DM family decodes into
/// the same variants via aliases. Maps 1:1 onto reconciler / unread / thread
/// operations in the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    #[serde(rename = "receive-message", alias = "receive-dm")]
    MessageReceived(Message),
    #[serde(rename = "message-edited", alias = "dm-edited")]
    MessageEdited(Message),
    #[serde(rename = "message-deleted", alias = "dm-deleted")]
    MessageDeleted {
        #[serde(rename = "conversationId")]
        conversation_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
    #[serde(rename = "message-reaction", alias = "dm-reaction")]
    ReactionChanged {
        #[serde(rename = "messageId")]
        message_id: String,
        emoji: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
}
