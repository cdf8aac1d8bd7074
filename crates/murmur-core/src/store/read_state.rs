//! Last-read watermark per (user, conversation).
//!
//! Advanced when the user opens a conversation (to the newest loaded message
//! instant) and when their own send is confirmed - never in response to other
//! users' messages. The unread counter consults it to decide whether an
//! inbound message counts as new.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::kv_ns;
use crate::store::kv::{self, KvStore};

pub struct ReadStateTracker {
    kv: Arc<dyn KvStore>,
}

impl ReadStateTracker {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn load_map(&self, user_id: &str) -> HashMap<String, u64> {
        kv::get_json(self.kv.as_ref(), &kv::user_key(kv_ns::READ_STATE, user_id))
            .unwrap_or_default()
    }

    fn save_map(&self, user_id: &str, map: &HashMap<String, u64>) {
        // Full map write: a partial key write could drop updates to other
        // conversations made between an async read and this write.
        kv::set_json(
            self.kv.as_ref(),
            &kv::user_key(kv_ns::READ_STATE, user_id),
            map,
        );
    }

    /// Move the watermark forward. A write that would move it backward (or
    /// leave it unchanged) is a no-op. Returns whether the value advanced.
    pub fn advance(&self, user_id: &str, conversation_id: &str, instant: u64) -> bool {
        let mut map = self.load_map(user_id);
        match map.get(conversation_id) {
            Some(&current) if current >= instant => false,
            _ => {
                map.insert(conversation_id.to_string(), instant);
                self.save_map(user_id, &map);
                true
            }
        }
    }

    pub fn get(&self, user_id: &str, conversation_id: &str) -> Option<u64> {
        self.load_map(user_id).get(conversation_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::InMemoryKvStore;

    fn tracker() -> ReadStateTracker {
        ReadStateTracker::new(Arc::new(InMemoryKvStore::new()))
    }

    #[test]
    fn test_advance_is_monotonic() {
        let t = tracker();
        assert!(t.advance("alice", "conv", 2000));
        assert!(!t.advance("alice", "conv", 1000));
        assert_eq!(t.get("alice", "conv"), Some(2000));
    }

    #[test]
    fn test_equal_instant_is_noop() {
        let t = tracker();
        t.advance("alice", "conv", 2000);
        assert!(!t.advance("alice", "conv", 2000));
    }

    #[test]
    fn test_absent_reads_as_none() {
        let t = tracker();
        assert_eq!(t.get("alice", "conv"), None);
    }

    #[test]
    fn test_conversations_are_independent() {
        let t = tracker();
        t.advance("alice", "conv1", 100);
        t.advance("alice", "conv2", 200);
        assert_eq!(t.get("alice", "conv1"), Some(100));
        assert_eq!(t.get("alice", "conv2"), Some(200));
    }
}
