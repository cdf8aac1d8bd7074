//! Message reconciler - single source of truth for an open conversation.
//!
//! Merges paginated REST history with push-delivered events by upsert-by-id:
//! both paths write the full record, so applying the same message twice, or a
//! push event before vs. after the page that also contains it, converges to
//! the same state. View derivation is a pure function over the stored set.

use std::collections::HashMap;

use crate::models::{now_millis, Delivery, Message, Reaction};
use crate::search::{message_matches, parse_search_terms};

pub struct MessageReconciler {
    conversation_id: String,
    messages: HashMap<String, Message>,
}

impl MessageReconciler {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: HashMap::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Bulk-merge a REST page. Existing entries are fully replaced by the
    /// incoming copy - the server is authoritative for history loads. Callers
    /// only reach this after a fully successful fetch+decode, so a failed
    /// fetch never partially merges.
    pub fn load_page(&mut self, items: Vec<Message>) {
        tracing::debug!(
            "reconciler: merging page of {} into {}",
            items.len(),
            self.conversation_id
        );
        for message in items {
            self.messages.insert(message.id.clone(), message);
        }
    }

    /// Insert if the id is unseen, otherwise replace. Last write wins by call
    /// order, not by timestamp.
    pub fn upsert(&mut self, message: Message) {
        self.messages.insert(message.id.clone(), message);
    }

    /// Replace an optimistic provisional entry with the server-confirmed copy
    /// (which carries the final id). If a push echo already inserted the
    /// confirmed id, the upsert converges on the same single row.
    pub fn confirm_send(&mut self, provisional_id: &str, confirmed: Message) {
        self.messages.remove(provisional_id);
        self.upsert(confirmed);
    }

    /// Find an outstanding provisional entry whose content matches a
    /// self-authored broadcast echo. When the ack is lost but the server
    /// processed the send, the echo is the only confirmation that arrives;
    /// matching it here lets the caller confirm instead of duplicating.
    pub fn provisional_matching(&self, body: &str, thread_root: Option<&str>) -> Option<&str> {
        self.messages
            .values()
            .find(|m| {
                m.is_provisional()
                    && m.delivery != Delivery::Confirmed
                    && m.body == body
                    && m.thread_root.as_deref() == thread_root
            })
            .map(|m| m.id.as_str())
    }

    /// Hard removal, no tombstone
    pub fn remove(&mut self, id: &str) -> Option<Message> {
        self.messages.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Toggle the (emoji, user) reaction pair on a stored message. Returns
    /// false when the message is unknown. Applied identically for local
    /// confirmations and remote broadcasts.
    pub fn patch_reactions(&mut self, id: &str, emoji: &str, user_id: &str) -> bool {
        match self.messages.get_mut(id) {
            Some(message) => {
                message.toggle_reaction(emoji, user_id);
                true
            }
            None => false,
        }
    }

    /// Replace the full reaction list with the server-canonical one
    pub fn set_reactions(&mut self, id: &str, reactions: Vec<Reaction>) -> bool {
        match self.messages.get_mut(id) {
            Some(message) => {
                message.reactions = reactions;
                true
            }
            None => false,
        }
    }

    /// Apply an edit to the stored copy in place (optimistic own echo)
    pub fn patch_body(&mut self, id: &str, body: &str) -> bool {
        match self.messages.get_mut(id) {
            Some(message) => {
                message.body = body.to_string();
                message.edited_at = Some(now_millis());
                true
            }
            None => false,
        }
    }

    /// Bump the reply count on a root message by exactly one. Callers
    /// de-duplicate by reply id so one logical reply never counts twice.
    pub fn increment_reply_count(&mut self, root_id: &str) -> bool {
        match self.messages.get_mut(root_id) {
            Some(root) => {
                root.reply_count = root.reply_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Rendered sequence for the view layer: ascending created-at order (ties
    /// by id), clear-marker filter, then the optional search filter.
    pub fn visible_messages(&self, cleared_at: Option<u64>, search: Option<&str>) -> Vec<Message> {
        derive_view(self.messages.values().cloned().collect(), cleared_at, search)
    }
}

/// Pure view derivation, independent of storage so it can be tested on its
/// own: sort by (created_at, id) ascending, hide everything at or before the
/// clear marker, then apply the case-insensitive body/sender search filter.
pub fn derive_view(
    mut items: Vec<Message>,
    cleared_at: Option<u64>,
    search: Option<&str>,
) -> Vec<Message> {
    if let Some(marker) = cleared_at {
        items.retain(|m| m.created_at > marker);
    }
    if let Some(query) = search {
        let terms = parse_search_terms(query);
        if !terms.is_empty() {
            items.retain(|m| message_matches(m, &terms));
        }
    }
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    items
}
