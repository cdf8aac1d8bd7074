//! reqwest-backed implementation of [`ChatApi`].

use async_trait::async_trait;
use serde_json::json;

use super::{validate_message, ChatApi, MessagePage, NewMessage, Pagination, ThreadPage};
use crate::error::ChatError;
use crate::models::{Message, Reaction};

pub struct HttpChatApi {
    client: reqwest::Client,
    base: String,
    auth_token: Option<String>,
}

impl HttpChatApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn decode_message(resp: reqwest::Response) -> Result<Message, ChatError> {
        let message: Message = resp.error_for_status()?.json().await?;
        validate_message(message)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_messages(
        &self,
        conversation_id: &str,
        page: Pagination,
    ) -> Result<MessagePage, ChatError> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/conversations/{conversation_id}/messages"),
            )
            .query(&[("limit", page.limit), ("offset", page.offset)])
            .send()
            .await?
            .error_for_status()?;

        let page: MessagePage = resp.json().await?;
        for message in &page.messages {
            if message.id.is_empty() {
                return Err(ChatError::Data("history page entry missing id".to_string()));
            }
        }
        Ok(page)
    }

    async fn get_thread(&self, root_id: &str, page: Pagination) -> Result<ThreadPage, ChatError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/messages/{root_id}/thread"))
            .query(&[("limit", page.limit), ("offset", page.offset)])
            .send()
            .await?
            .error_for_status()?;

        let page: ThreadPage = resp.json().await?;
        if page.root.id.is_empty() {
            return Err(ChatError::Data("thread root missing id".to_string()));
        }
        for reply in &page.replies {
            if reply.id.is_empty() {
                return Err(ChatError::Data("thread reply missing id".to_string()));
            }
        }
        Ok(page)
    }

    async fn create_message(&self, draft: &NewMessage) -> Result<Message, ChatError> {
        let resp = self
            .request(reqwest::Method::POST, "/messages")
            .json(draft)
            .send()
            .await?;
        Self::decode_message(resp).await
    }

    async fn update_message(&self, id: &str, body: &str) -> Result<Message, ChatError> {
        let resp = self
            .request(reqwest::Method::PATCH, &format!("/messages/{id}"))
            .json(&json!({ "body": body }))
            .send()
            .await?;
        Self::decode_message(resp).await
    }

    async fn delete_message(&self, id: &str) -> Result<(), ChatError> {
        self.request(reqwest::Method::DELETE, &format!("/messages/{id}"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn react_message(&self, id: &str, emoji: &str) -> Result<Vec<Reaction>, ChatError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/messages/{id}/reactions"))
            .json(&json!({ "emoji": emoji }))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn pin_message(&self, id: &str) -> Result<Message, ChatError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/messages/{id}/pin"))
            .send()
            .await?;
        Self::decode_message(resp).await
    }

    async fn unpin_message(&self, id: &str) -> Result<Message, ChatError> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("/messages/{id}/pin"))
            .send()
            .await?;
        Self::decode_message(resp).await
    }

    async fn vote_message_poll(
        &self,
        id: &str,
        option_index: usize,
    ) -> Result<Message, ChatError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/messages/{id}/poll/vote"))
            .json(&json!({ "optionIndex": option_index }))
            .send()
            .await?;
        Self::decode_message(resp).await
    }
}
