use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PROVISIONAL_ID_PREFIX;

/// Current Unix timestamp in milliseconds
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A file or image attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    /// Attachment kind as reported by the server (e.g. "image", "file")
    pub kind: String,
    pub name: String,
    pub size: u64,
}

/// One (emoji, user) reaction pair. A message never holds the same pair twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub voter_ids: Vec<String>,
}

impl PollOption {
    pub fn has_voted(&self, user_id: &str) -> bool {
        self.voter_ids.iter().any(|v| v == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
}

/// Local-only delivery state of a message.
///
/// Everything that came from the server is `Confirmed`. An optimistic send is
/// `Pending` until acknowledged; if both the push and the REST path fail it
/// becomes `Failed`, which the UI renders with a retry affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    Pending,
    #[default]
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque server-assigned id, stable across edits.
    /// Provisional (optimistic) copies carry a "tmp-" prefixed local id
    /// until the server copy replaces them.
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub poll: Option<Poll>,
    /// Root message id when this message is a thread reply; None for roots
    #[serde(default)]
    pub thread_root: Option<String>,
    /// Number of replies under this message; only meaningful on roots
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub edited_at: Option<u64>,
    #[serde(default)]
    pub deleted_at: Option<u64>,
    /// Authoritative ordering key (Unix millis)
    pub created_at: u64,
    /// Local delivery state; never serialized, server copies default to Confirmed
    #[serde(skip)]
    pub delivery: Delivery,
}

impl Message {
    /// Build the provisional copy for an optimistic send. The id is local
    /// ("tmp-" + uuid) and is replaced wholesale once the server acknowledges.
    pub fn provisional(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        body: impl Into<String>,
        attachments: Vec<Attachment>,
        thread_root: Option<String>,
    ) -> Self {
        Self {
            id: format!("{}{}", PROVISIONAL_ID_PREFIX, Uuid::new_v4()),
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            body: body.into(),
            attachments,
            reactions: Vec::new(),
            poll: None,
            thread_root,
            reply_count: 0,
            pinned: false,
            edited_at: None,
            deleted_at: None,
            created_at: now_millis(),
            delivery: Delivery::Pending,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(PROVISIONAL_ID_PREFIX)
    }

    /// A message without a thread-root reference anchors its own thread
    pub fn is_root(&self) -> bool {
        self.thread_root.is_none()
    }

    pub fn is_reply_to(&self, root_id: &str) -> bool {
        self.thread_root.as_deref() == Some(root_id)
    }

    /// Total-order key for the rendered sequence: created_at ascending,
    /// ties broken by id string comparison for determinism.
    pub fn sort_key(&self) -> (u64, &str) {
        (self.created_at, self.id.as_str())
    }

    pub fn has_reaction(&self, emoji: &str, user_id: &str) -> bool {
        self.reactions
            .iter()
            .any(|r| r.emoji == emoji && r.user_id == user_id)
    }

    /// Toggle the (emoji, user) pair: remove it when present, append it when
    /// absent. Applying the same toggle from the local confirmed response and
    /// from a push echo must converge, so callers de-duplicate echoes; the
    /// toggle itself is the single mutation primitive for reactions.
    pub fn toggle_reaction(&mut self, emoji: &str, user_id: &str) {
        if let Some(idx) = self
            .reactions
            .iter()
            .position(|r| r.emoji == emoji && r.user_id == user_id)
        {
            self.reactions.remove(idx);
        } else {
            self.reactions.push(Reaction {
                emoji: emoji.to_string(),
                user_id: user_id.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, created_at: u64) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: "conv".to_string(),
            sender_id: "alice".to_string(),
            body: "hello".to_string(),
            attachments: vec![],
            reactions: vec![],
            poll: None,
            thread_root: None,
            reply_count: 0,
            pinned: false,
            edited_at: None,
            deleted_at: None,
            created_at,
            delivery: Delivery::Confirmed,
        }
    }

    #[test]
    fn test_provisional_is_pending_with_tmp_id() {
        let msg = Message::provisional("conv", "alice", "hi", vec![], None);
        assert!(msg.is_provisional());
        assert_eq!(msg.delivery, Delivery::Pending);
        assert!(msg.is_root());
    }

    #[test]
    fn test_sort_key_ties_break_by_id() {
        let a = message("a", 100);
        let b = message("b", 100);
        assert!(a.sort_key() < b.sort_key());
    }

    #[test]
    fn test_toggle_reaction_roundtrip() {
        let mut msg = message("m1", 100);
        msg.toggle_reaction("👍", "bob");
        assert!(msg.has_reaction("👍", "bob"));
        msg.toggle_reaction("👍", "bob");
        assert!(!msg.has_reaction("👍", "bob"));
        assert!(msg.reactions.is_empty());
    }

    #[test]
    fn test_toggle_reaction_distinct_pairs() {
        let mut msg = message("m1", 100);
        msg.toggle_reaction("👍", "bob");
        msg.toggle_reaction("👍", "carol");
        msg.toggle_reaction("🎉", "bob");
        assert_eq!(msg.reactions.len(), 3);
        msg.toggle_reaction("👍", "bob");
        assert_eq!(msg.reactions.len(), 2);
        assert!(msg.has_reaction("👍", "carol"));
        assert!(msg.has_reaction("🎉", "bob"));
    }

    #[test]
    fn test_deserialize_defaults_to_confirmed() {
        let json = r#"{
            "id": "abc",
            "conversationId": "conv",
            "senderId": "alice",
            "body": "hi",
            "createdAt": 1000
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.delivery, Delivery::Confirmed);
        assert!(msg.reactions.is_empty());
        assert!(msg.is_root());
    }
}
