use std::time::Instant;

use crate::constants::THREAD_NOTICE_DURATION;
use crate::models::Message;

/// Cached view of an open thread: the root plus its replies, fetched on
/// demand. Derived state - never persisted. The reply count lives on the root
/// message itself so conversation lists can show it without fetching replies.
#[derive(Debug, Clone)]
pub struct ThreadState {
    pub root: Message,
    /// Replies in created-at order
    pub replies: Vec<Message>,
}

impl ThreadState {
    pub fn new(root: Message, mut replies: Vec<Message>) -> Self {
        replies.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { root, replies }
    }

    /// Insert a reply keeping created-at order; replaces any copy with the
    /// same id first so an echo never duplicates a row.
    pub fn insert_reply(&mut self, reply: Message) {
        self.replies.retain(|r| r.id != reply.id);
        let idx = self
            .replies
            .partition_point(|r| r.sort_key() < reply.sort_key());
        self.replies.insert(idx, reply);
    }

    pub fn remove_reply(&mut self, id: &str) {
        self.replies.retain(|r| r.id != id);
    }
}

/// Transient "new reply" banner shown when a reply lands in a thread that is
/// not currently open. Auto-expires; a superseding notice resets the timer.
#[derive(Debug, Clone)]
pub struct ReplyNotice {
    pub root_id: String,
    pub preview: String,
    pub shown_at: Instant,
}

impl ReplyNotice {
    pub fn new(root_id: impl Into<String>, preview: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            preview: preview.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= THREAD_NOTICE_DURATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Delivery;

    fn message(id: &str, created_at: u64, root: Option<&str>) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: "conv".to_string(),
            sender_id: "alice".to_string(),
            body: "reply".to_string(),
            attachments: vec![],
            reactions: vec![],
            poll: None,
            thread_root: root.map(|r| r.to_string()),
            reply_count: 0,
            pinned: false,
            edited_at: None,
            deleted_at: None,
            created_at,
            delivery: Delivery::Confirmed,
        }
    }

    #[test]
    fn test_replies_sorted_on_construction() {
        let root = message("root", 100, None);
        let state = ThreadState::new(
            root,
            vec![
                message("r2", 300, Some("root")),
                message("r1", 200, Some("root")),
            ],
        );
        let ids: Vec<&str> = state.replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_insert_reply_keeps_order_and_deduplicates() {
        let root = message("root", 100, None);
        let mut state = ThreadState::new(root, vec![message("r1", 200, Some("root"))]);

        state.insert_reply(message("r0", 150, Some("root")));
        state.insert_reply(message("r0", 150, Some("root")));

        let ids: Vec<&str> = state.replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1"]);
    }

    #[test]
    fn test_fresh_notice_is_not_expired() {
        let notice = ReplyNotice::new("root", "new reply");
        assert!(!notice.is_expired());
    }

    #[test]
    fn test_notice_expires_after_duration() {
        let mut notice = ReplyNotice::new("root", "new reply");
        notice.shown_at = Instant::now() - THREAD_NOTICE_DURATION;
        assert!(notice.is_expired());
    }
}
