//! Thread-reply aggregation.
//!
//! Tracks reply counts on root messages and the transient "new reply" banner
//! for threads that are not currently open. Counting is de-duplicated by
//! reply id here, so a reply observed through an optimistic send, a REST
//! response, and a push echo still bumps the root exactly once.

use std::collections::HashSet;

use crate::models::{Message, ReplyNotice, ThreadState};
use crate::store::MessageReconciler;

#[derive(Default)]
pub struct ThreadAggregator {
    /// Reply ids already counted against their root
    observed_reply_ids: HashSet<String>,
    open_thread: Option<ThreadState>,
    notice: Option<ReplyNotice>,
}

impl ThreadAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_root_id(&self) -> Option<&str> {
        self.open_thread.as_ref().map(|t| t.root.id.as_str())
    }

    pub fn thread_view(&self) -> Option<&ThreadState> {
        self.open_thread.as_ref()
    }

    /// Cache a freshly fetched thread, replacing any previous reply list.
    /// Fetched replies are marked observed: the server's root already carries
    /// their count, so a late echo of one must not bump it again.
    pub fn set_open(&mut self, state: ThreadState) -> &ThreadState {
        for reply in &state.replies {
            self.observed_reply_ids.insert(reply.id.clone());
        }
        // Opening the thread supersedes any pending banner for it
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.root_id == state.root.id)
        {
            self.notice = None;
        }
        self.open_thread.insert(state)
    }

    pub fn close(&mut self) {
        self.open_thread = None;
    }

    /// Count a reply against its root exactly once per distinct reply id.
    /// Returns whether the count changed.
    pub fn on_reply_observed(
        &mut self,
        reconciler: &mut MessageReconciler,
        reply: &Message,
    ) -> bool {
        let Some(root_id) = reply.thread_root.clone() else {
            return false;
        };
        if !self.observed_reply_ids.insert(reply.id.clone()) {
            return false;
        }
        if let Some(thread) = self.open_thread.as_mut() {
            if thread.root.id == root_id {
                thread.root.reply_count = thread.root.reply_count.saturating_add(1);
            }
        }
        reconciler.increment_reply_count(&root_id)
    }

    /// Route an observed reply to the UI: appended in order when its thread
    /// is the open one, otherwise surfaced as a transient banner.
    pub fn route_reply(&mut self, reply: &Message) {
        let Some(root_id) = reply.thread_root.as_deref() else {
            return;
        };
        if self.open_root_id() == Some(root_id) {
            if let Some(thread) = self.open_thread.as_mut() {
                thread.insert_reply(reply.clone());
            }
        } else {
            self.notice(root_id, &reply.body);
        }
    }

    /// Drop a deleted reply from the open thread's cached list, if present
    pub fn remove_reply(&mut self, id: &str) {
        if let Some(thread) = self.open_thread.as_mut() {
            thread.remove_reply(id);
        }
    }

    /// Record a "new reply" banner. A superseding call - same root or a
    /// different one - replaces the banner and restarts its timer.
    pub fn notice(&mut self, root_id: &str, preview: &str) {
        self.notice = Some(ReplyNotice::new(root_id, preview));
    }

    /// The banner currently worth showing, if it has not auto-expired
    pub fn active_notice(&self) -> Option<&ReplyNotice> {
        self.notice.as_ref().filter(|n| !n.is_expired())
    }

    /// Apply an edit to the cached root or reply copy, if present
    pub fn patch_body(&mut self, id: &str, body: &str) -> bool {
        let Some(thread) = self.open_thread.as_mut() else {
            return false;
        };
        if thread.root.id == id {
            thread.root.body = body.to_string();
            return true;
        }
        if let Some(reply) = thread.replies.iter_mut().find(|r| r.id == id) {
            reply.body = body.to_string();
            return true;
        }
        false
    }

    /// Toggle a reaction pair on the cached root or reply copy, if present
    pub fn patch_reaction(&mut self, id: &str, emoji: &str, user_id: &str) {
        if let Some(thread) = self.open_thread.as_mut() {
            if thread.root.id == id {
                thread.root.toggle_reaction(emoji, user_id);
            } else if let Some(reply) = thread.replies.iter_mut().find(|r| r.id == id) {
                reply.toggle_reaction(emoji, user_id);
            }
        }
    }

    /// Replace the cached reaction list with the server-canonical one
    pub fn set_reactions(&mut self, id: &str, reactions: &[crate::models::Reaction]) {
        if let Some(thread) = self.open_thread.as_mut() {
            if thread.root.id == id {
                thread.root.reactions = reactions.to_vec();
            } else if let Some(reply) = thread.replies.iter_mut().find(|r| r.id == id) {
                reply.reactions = reactions.to_vec();
            }
        }
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
            body: format!("body of {id}"),
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
    fn test_reply_counted_exactly_once() {
        let mut agg = ThreadAggregator::new();
        let mut reconciler = MessageReconciler::new("conv");
        reconciler.upsert(message("root", 100, None));

        let reply = message("r1", 200, Some("root"));
        assert!(agg.on_reply_observed(&mut reconciler, &reply));
        // Push echo of the same reply
        assert!(!agg.on_reply_observed(&mut reconciler, &reply));

        assert_eq!(reconciler.get("root").unwrap().reply_count, 1);
    }

    #[test]
    fn test_non_reply_is_ignored() {
        let mut agg = ThreadAggregator::new();
        let mut reconciler = MessageReconciler::new("conv");
        reconciler.upsert(message("root", 100, None));
        assert!(!agg.on_reply_observed(&mut reconciler, &message("m2", 200, None)));
        assert_eq!(reconciler.get("root").unwrap().reply_count, 0);
    }

    #[test]
    fn test_route_reply_appends_to_open_thread() {
        let mut agg = ThreadAggregator::new();
        agg.set_open(ThreadState::new(message("root", 100, None), vec![]));

        agg.route_reply(&message("r1", 200, Some("root")));

        let thread = agg.thread_view().unwrap();
        assert_eq!(thread.replies.len(), 1);
        assert!(agg.active_notice().is_none());
    }

    #[test]
    fn test_route_reply_to_closed_thread_raises_notice() {
        let mut agg = ThreadAggregator::new();
        agg.set_open(ThreadState::new(message("other", 100, None), vec![]));

        agg.route_reply(&message("r1", 200, Some("root")));

        let notice = agg.active_notice().unwrap();
        assert_eq!(notice.root_id, "root");
        assert_eq!(notice.preview, "body of r1");
        assert_eq!(agg.thread_view().unwrap().replies.len(), 0);
    }

    #[test]
    fn test_superseding_notice_replaces() {
        let mut agg = ThreadAggregator::new();
        agg.notice("root-a", "first");
        agg.notice("root-b", "second");
        assert_eq!(agg.active_notice().unwrap().root_id, "root-b");
    }

    #[test]
    fn test_expired_notice_is_not_surfaced() {
        let mut agg = ThreadAggregator::new();
        agg.notice("root", "pending");
        assert!(agg.active_notice().is_some());

        if let Some(n) = agg.notice.as_mut() {
            n.shown_at = std::time::Instant::now() - crate::constants::THREAD_NOTICE_DURATION;
        }
        assert!(agg.active_notice().is_none());
    }

    #[test]
    fn test_opening_thread_clears_its_notice() {
        let mut agg = ThreadAggregator::new();
        agg.notice("root", "pending");
        agg.set_open(ThreadState::new(message("root", 100, None), vec![]));
        assert!(agg.active_notice().is_none());
    }

    #[test]
    fn test_fetched_replies_are_pre_observed() {
        let mut agg = ThreadAggregator::new();
        let mut reconciler = MessageReconciler::new("conv");
        let mut root = message("root", 100, None);
        root.reply_count = 1; // server count already includes r1
        reconciler.upsert(root.clone());

        let fetched = message("r1", 200, Some("root"));
        agg.set_open(ThreadState::new(root, vec![fetched.clone()]));

        // A late push echo of the fetched reply must not bump the count
        assert!(!agg.on_reply_observed(&mut reconciler, &fetched));
        assert_eq!(reconciler.get("root").unwrap().reply_count, 1);
    }

    #[test]
    fn test_remove_reply_from_open_thread() {
        let mut agg = ThreadAggregator::new();
        agg.set_open(ThreadState::new(
            message("root", 100, None),
            vec![message("r1", 200, Some("root"))],
        ));
        agg.remove_reply("r1");
        assert!(agg.thread_view().unwrap().replies.is_empty());
    }
}
