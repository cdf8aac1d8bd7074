//! "Cleared at" watermark per (user, conversation).
//!
//! A view-level filter only: messages at or before the marker are hidden from
//! this user's rendered history but stay on the server and in everyone else's
//! view. The marker is stamped to "now" on every clear action and never moves
//! backward implicitly.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::kv_ns;
use crate::models::now_millis;
use crate::store::kv::{self, KvStore};

pub struct ClearMarkerStore {
    kv: Arc<dyn KvStore>,
}

impl ClearMarkerStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn load_map(&self, user_id: &str) -> HashMap<String, u64> {
        kv::get_json(self.kv.as_ref(), &kv::user_key(kv_ns::CLEAR_MARKER, user_id))
            .unwrap_or_default()
    }

    /// Stamp the marker to "now". Idempotent to repeat; each call moves the
    /// marker forward. If the clock reads earlier than the stored marker the
    /// stored value is kept (moving backward needs an explicit administrative
    /// action that this store does not expose).
    pub fn set_cleared_now(&self, user_id: &str, conversation_id: &str) -> u64 {
        let mut map = self.load_map(user_id);
        let now = now_millis();
        let marker = map
            .get(conversation_id)
            .map_or(now, |&existing| existing.max(now));
        map.insert(conversation_id.to_string(), marker);
        kv::set_json(
            self.kv.as_ref(),
            &kv::user_key(kv_ns::CLEAR_MARKER, user_id),
            &map,
        );
        marker
    }

    pub fn get(&self, user_id: &str, conversation_id: &str) -> Option<u64> {
        self.load_map(user_id).get(conversation_id).copied()
    }
}
