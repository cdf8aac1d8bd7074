//! REST collaborator interfaces.
//!
//! The engine consumes history fetches and mutations through [`ChatApi`]
//! only; [`http::HttpChatApi`] is the production implementation. Every
//! mutation returns the canonical updated message (reactions return the
//! canonical reaction list) so callers can upsert the server copy wholesale.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::models::{Attachment, Message, Reaction};

pub use http::HttpChatApi;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: crate::constants::DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    pub root: Message,
    pub replies: Vec<Message>,
    pub total: u64,
}

/// Outbound payload for a send; the same shape goes over REST and over the
/// push socket's send-with-ack emit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_root: Option<String>,
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn list_messages(
        &self,
        conversation_id: &str,
        page: Pagination,
    ) -> Result<MessagePage, ChatError>;

    async fn get_thread(&self, root_id: &str, page: Pagination) -> Result<ThreadPage, ChatError>;

    async fn create_message(&self, draft: &NewMessage) -> Result<Message, ChatError>;

    async fn update_message(&self, id: &str, body: &str) -> Result<Message, ChatError>;

    async fn delete_message(&self, id: &str) -> Result<(), ChatError>;

    /// Toggle the caller's reaction; returns the canonical reaction list
    async fn react_message(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError>;

    async fn pin_message(&self, id: &str) -> Result<Message, ChatError>;

    async fn unpin_message(&self, id: &str) -> Result<Message, ChatError>;

    async fn vote_message_poll(&self, id: &str, option_index: usize)
        -> Result<Message, ChatError>;
}

/// Reject a decoded message whose id is missing/empty before it can enter the
/// reconciler.
pub(crate) fn validate_message(message: Message) -> Result<Message, ChatError> {
    if message.id.is_empty() {
        return Err(ChatError::Data("message payload missing id".to_string()));
    }
    Ok(message)
}
