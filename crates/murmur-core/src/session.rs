//! Realtime event adapter for one open conversation.
//!
//! [`ChatSession`] owns the reconciler, the per-user state trackers, and the
//! thread aggregator, translating user actions into optimistic applies plus
//! push/REST mutations, and inbound push events into reconciler / unread /
//! thread operations. The view layer consumes it through plain accessors and
//! never sees a transport.

use std::sync::Arc;

use crate::api::{ChatApi, NewMessage, Pagination};
use crate::bus::InvalidationBus;
use crate::error::ChatError;
use crate::models::{
    Attachment, ConversationKind, Delivery, Message, ReplyNotice, ThreadState,
};
use crate::realtime::{DualPathSender, PushEvent, PushTransport};
use crate::store::{
    ClearMarkerStore, KvStore, MessageReconciler, ReadStateTracker, UnreadCounter,
};
use crate::threads::ThreadAggregator;

pub struct ChatSession {
    user_id: String,
    conversation_id: String,
    api: Arc<dyn ChatApi>,
    sender: DualPathSender,
    reconciler: MessageReconciler,
    read_state: ReadStateTracker,
    unread: UnreadCounter,
    clear_markers: ClearMarkerStore,
    threads: ThreadAggregator,
    bus: InvalidationBus,
    search: Option<String>,
    /// Liveness flag: set false on close; results of in-flight calls and any
    /// later push events are ignored rather than cancelled.
    open: bool,
}

impl ChatSession {
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        kind: ConversationKind,
        api: Arc<dyn ChatApi>,
        transport: Option<Arc<dyn PushTransport>>,
        kv: Arc<dyn KvStore>,
        bus: InvalidationBus,
    ) -> Self {
        let conversation_id = conversation_id.into();
        Self {
            user_id: user_id.into(),
            reconciler: MessageReconciler::new(conversation_id.clone()),
            conversation_id,
            api: Arc::clone(&api),
            sender: DualPathSender::new(api, transport, kind),
            read_state: ReadStateTracker::new(Arc::clone(&kv)),
            unread: UnreadCounter::new(Arc::clone(&kv)),
            clear_markers: ClearMarkerStore::new(kv),
            threads: ThreadAggregator::new(),
            bus,
            search: None,
            open: true,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Initial history fetch. On error the local set is left untouched and
    /// the error surfaces to the caller. On success the read-state watermark
    /// advances to the newest loaded instant and the unread counter resets
    /// (both best-effort - storage trouble never fails the open).
    pub async fn open(&mut self) -> Result<(), ChatError> {
        let page = self
            .api
            .list_messages(&self.conversation_id, Pagination::default())
            .await?;
        if !self.open {
            return Ok(());
        }

        let newest = page.messages.iter().map(|m| m.created_at).max();
        self.reconciler.load_page(page.messages);

        if let Some(instant) = newest {
            self.read_state
                .advance(&self.user_id, &self.conversation_id, instant);
        }
        self.unread.clear(&self.user_id, &self.conversation_id);
        Ok(())
    }

    /// Tear the session down. In-flight network results and push events that
    /// arrive after this are ignored.
    pub fn close(&mut self) {
        self.open = false;
        self.threads.close();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // ------------------------------------------------------------------
    // Outbound actions
    // ------------------------------------------------------------------

    /// Optimistic send: a provisional Pending copy goes into the set first,
    /// then push-with-ack (REST fallback). On confirm the provisional entry
    /// is replaced by the server copy; on failure it is marked Failed and the
    /// error surfaces for a retry affordance. Returns the confirmed id.
    pub async fn send(
        &mut self,
        body: impl Into<String>,
        attachments: Vec<Attachment>,
        thread_root: Option<String>,
    ) -> Result<String, ChatError> {
        let provisional = Message::provisional(
            self.conversation_id.clone(),
            self.user_id.clone(),
            body,
            attachments,
            thread_root,
        );
        let draft = NewMessage {
            conversation_id: provisional.conversation_id.clone(),
            body: provisional.body.clone(),
            attachments: provisional.attachments.clone(),
            thread_root: provisional.thread_root.clone(),
        };
        let provisional_id = provisional.id.clone();
        self.reconciler.upsert(provisional);
        self.dispatch_send(provisional_id, draft).await
    }

    /// Re-attempt a send whose provisional copy ended up Failed.
    pub async fn retry_send(&mut self, provisional_id: &str) -> Result<String, ChatError> {
        let Some(existing) = self.reconciler.get(provisional_id) else {
            return Err(ChatError::UnknownMessage(provisional_id.to_string()));
        };
        if existing.delivery != Delivery::Failed {
            return Err(ChatError::NotRetryable(provisional_id.to_string()));
        }
        let draft = NewMessage {
            conversation_id: existing.conversation_id.clone(),
            body: existing.body.clone(),
            attachments: existing.attachments.clone(),
            thread_root: existing.thread_root.clone(),
        };
        if let Some(message) = self.reconciler.get_mut(provisional_id) {
            message.delivery = Delivery::Pending;
        }
        self.dispatch_send(provisional_id.to_string(), draft).await
    }

    async fn dispatch_send(
        &mut self,
        provisional_id: String,
        draft: NewMessage,
    ) -> Result<String, ChatError> {
        match self.sender.send(&draft).await {
            Ok(confirmed) => {
                let confirmed_id = confirmed.id.clone();
                if !self.open {
                    return Ok(confirmed_id);
                }
                self.reconciler.confirm_send(&provisional_id, confirmed.clone());
                if let Some(root_id) = confirmed.thread_root.as_deref() {
                    self.threads
                        .on_reply_observed(&mut self.reconciler, &confirmed);
                    // Append to the reply list only when that thread is open;
                    // a banner for the user's own reply would be noise
                    if self.threads.open_root_id() == Some(root_id) {
                        self.threads.route_reply(&confirmed);
                    }
                }
                self.read_state
                    .advance(&self.user_id, &self.conversation_id, confirmed.created_at);
                self.unread.clear(&self.user_id, &self.conversation_id);
                self.bus.publish();
                Ok(confirmed_id)
            }
            Err(e) => {
                tracing::warn!("send failed on both paths: {e}");
                if let Some(message) = self.reconciler.get_mut(&provisional_id) {
                    message.delivery = Delivery::Failed;
                }
                Err(e)
            }
        }
    }

    /// Edit with optimistic own-echo apply; the confirmed copy replaces it.
    pub async fn edit(&mut self, id: &str, body: &str) -> Result<(), ChatError> {
        let in_set = self.reconciler.patch_body(id, body);
        let in_thread = self.threads.patch_body(id, body);
        if !in_set && !in_thread {
            return Err(ChatError::UnknownMessage(id.to_string()));
        }
        let confirmed = self.sender.edit(id, body).await?;
        if self.open {
            self.apply_confirmed(confirmed);
        }
        Ok(())
    }

    /// Delete with optimistic own-echo removal (hard removal, no tombstone).
    /// A transport failure surfaces but does not restore the local copy.
    pub async fn delete(&mut self, id: &str) -> Result<(), ChatError> {
        let in_set = self.reconciler.remove(id).is_some();
        let in_thread = self
            .threads
            .thread_view()
            .is_some_and(|t| t.root.id == id || t.replies.iter().any(|r| r.id == id));
        if !in_set && !in_thread {
            return Err(ChatError::UnknownMessage(id.to_string()));
        }
        self.threads.remove_reply(id);
        self.sender.delete(id).await?;
        if self.open {
            self.bus.publish();
        }
        Ok(())
    }

    /// Toggle the user's reaction. Deliberately NOT optimistic: the confirmed
    /// reaction list is the sole source of truth, so a local toggle plus its
    /// push echo can never double-apply.
    pub async fn react(&mut self, id: &str, emoji: &str) -> Result<(), ChatError> {
        let reactions = self.sender.react(id, emoji).await?;
        if self.open {
            self.reconciler.set_reactions(id, reactions.clone());
            self.threads.set_reactions(id, &reactions);
        }
        Ok(())
    }

    /// Vote in a message poll; confirmed copy only.
    pub async fn vote_poll(&mut self, id: &str, option_index: usize) -> Result<(), ChatError> {
        let confirmed = self.api.vote_message_poll(id, option_index).await?;
        if self.open {
            self.apply_confirmed(confirmed);
        }
        Ok(())
    }

    /// Pin or unpin; modeled as a message-field patch.
    pub async fn set_pinned(&mut self, id: &str, pinned: bool) -> Result<(), ChatError> {
        let confirmed = if pinned {
            self.api.pin_message(id).await?
        } else {
            self.api.unpin_message(id).await?
        };
        if self.open {
            self.apply_confirmed(confirmed);
        }
        Ok(())
    }

    /// Fetch a thread and make it the open one, replacing any cached replies.
    pub async fn open_thread(
        &mut self,
        root_id: &str,
        page: Pagination,
    ) -> Result<&ThreadState, ChatError> {
        let thread = self.api.get_thread(root_id, page).await?;
        // The fetched root is authoritative; refresh the conversation copy too
        self.reconciler.upsert(thread.root.clone());
        Ok(self
            .threads
            .set_open(ThreadState::new(thread.root, thread.replies)))
    }

    pub fn close_thread(&mut self) {
        self.threads.close();
    }

    /// Stamp the "cleared at" watermark to now. View-level only: nothing is
    /// deleted from the server or from other users' views.
    pub fn clear_chat(&mut self) -> u64 {
        self.clear_markers
            .set_cleared_now(&self.user_id, &self.conversation_id)
    }

    // ------------------------------------------------------------------
    // Inbound push events
    // ------------------------------------------------------------------

    /// Map one inbound push event onto the reconciler / unread / thread
    /// components. Events arriving after close are dropped.
    pub fn handle_push_event(&mut self, event: PushEvent) {
        if !self.open {
            return;
        }
        match event {
            PushEvent::MessageReceived(message) => self.on_message_received(message),
            PushEvent::MessageEdited(message) => {
                if message.conversation_id != self.conversation_id {
                    return;
                }
                self.apply_confirmed(message);
            }
            PushEvent::MessageDeleted {
                conversation_id,
                message_id,
            } => {
                if conversation_id != self.conversation_id {
                    return;
                }
                self.reconciler.remove(&message_id);
                self.threads.remove_reply(&message_id);
            }
            PushEvent::ReactionChanged {
                message_id,
                emoji,
                user_id,
            } => {
                // The session user's own toggles are owned by the confirmed
                // response path; applying the echo too would toggle twice.
                if user_id == self.user_id {
                    return;
                }
                self.reconciler.patch_reactions(&message_id, &emoji, &user_id);
                self.threads.patch_reaction(&message_id, &emoji, &user_id);
            }
        }
    }

    fn on_message_received(&mut self, message: Message) {
        let is_self = message.sender_id == self.user_id;

        // Unread accounting applies to every conversation this user is in,
        // not just the open one
        if !is_self {
            let newer = self
                .read_state
                .get(&self.user_id, &message.conversation_id)
                .map_or(true, |watermark| message.created_at > watermark);
            if newer {
                self.unread.increment(&self.user_id, &message.conversation_id);
            }
        }

        if message.conversation_id != self.conversation_id {
            return;
        }

        // A self echo may be the only confirmation that arrives when the ack
        // was lost: match it against an outstanding provisional so the set
        // never holds both copies (and a retry can never double-post).
        let outstanding = if is_self {
            self.reconciler
                .provisional_matching(&message.body, message.thread_root.as_deref())
                .map(str::to_string)
        } else {
            None
        };
        match outstanding {
            Some(provisional_id) => {
                self.reconciler.confirm_send(&provisional_id, message.clone())
            }
            None => self.reconciler.upsert(message.clone()),
        }
        if message.thread_root.is_some() {
            self.threads.on_reply_observed(&mut self.reconciler, &message);
            // The echo of the user's own reply was already routed on confirm
            if !is_self {
                self.threads.route_reply(&message);
            }
        }
    }

    // ------------------------------------------------------------------
    // View accessors (transport-free)
    // ------------------------------------------------------------------

    pub fn visible_messages(&self) -> Vec<Message> {
        let cleared_at = self
            .clear_markers
            .get(&self.user_id, &self.conversation_id);
        self.reconciler
            .visible_messages(cleared_at, self.search.as_deref())
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.reconciler.get(id)
    }

    pub fn set_search(&mut self, query: Option<String>) {
        self.search = query;
    }

    pub fn unread(&self) -> u32 {
        self.unread.get(&self.user_id, &self.conversation_id)
    }

    pub fn unread_for(&self, conversation_id: &str) -> u32 {
        self.unread.get(&self.user_id, conversation_id)
    }

    pub fn last_read(&self) -> Option<u64> {
        self.read_state.get(&self.user_id, &self.conversation_id)
    }

    pub fn cleared_at(&self) -> Option<u64> {
        self.clear_markers.get(&self.user_id, &self.conversation_id)
    }

    pub fn thread_view(&self) -> Option<&ThreadState> {
        self.threads.thread_view()
    }

    pub fn active_notice(&self) -> Option<&ReplyNotice> {
        self.threads.active_notice()
    }

    /// Confirmed copy from the server: refresh the open-thread cache when it
    /// belongs there, then upsert into the set.
    fn apply_confirmed(&mut self, message: Message) {
        if let Some(root_id) = message.thread_root.as_deref() {
            if self.threads.open_root_id() == Some(root_id) {
                self.threads.route_reply(&message);
            }
        }
        self.reconciler.upsert(message);
    }
}
