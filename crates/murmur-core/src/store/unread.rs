//! Pending-message counter per (user, conversation).
//!
//! Incremented once per inbound message authored by someone else that is
//! newer than the read-state watermark; reset to zero on conversation open
//! or a self-authored send. The stored integer is never capped - only the
//! rendered form is.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{kv_ns, UNREAD_DISPLAY_CAP};
use crate::store::kv::{self, KvStore};

pub struct UnreadCounter {
    kv: Arc<dyn KvStore>,
}

impl UnreadCounter {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn load_map(&self, user_id: &str) -> HashMap<String, u32> {
        kv::get_json(self.kv.as_ref(), &kv::user_key(kv_ns::UNREAD, user_id)).unwrap_or_default()
    }

    fn save_map(&self, user_id: &str, map: &HashMap<String, u32>) {
        kv::set_json(self.kv.as_ref(), &kv::user_key(kv_ns::UNREAD, user_id), map);
    }

    /// Add one pending message; returns the new count.
    pub fn increment(&self, user_id: &str, conversation_id: &str) -> u32 {
        let mut map = self.load_map(user_id);
        let count = map.entry(conversation_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let new_count = *count;
        self.save_map(user_id, &map);
        new_count
    }

    /// Reset the counter to zero (conversation opened, or own send confirmed)
    pub fn clear(&self, user_id: &str, conversation_id: &str) {
        let mut map = self.load_map(user_id);
        if map.insert(conversation_id.to_string(), 0) != Some(0) {
            self.save_map(user_id, &map);
        }
    }

    pub fn get(&self, user_id: &str, conversation_id: &str) -> u32 {
        self.load_map(user_id)
            .get(conversation_id)
            .copied()
            .unwrap_or(0)
    }
}

/// Rendered form of an unread count: capped at [`UNREAD_DISPLAY_CAP`] with a
/// trailing '+'. The stored value is untouched.
pub fn format_unread(count: u32) -> String {
    if count > UNREAD_DISPLAY_CAP {
        format!("{UNREAD_DISPLAY_CAP}+")
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::InMemoryKvStore;

    fn counter() -> UnreadCounter {
        UnreadCounter::new(Arc::new(InMemoryKvStore::new()))
    }

    #[test]
    fn test_increment_then_clear_then_increment() {
        let c = counter();
        c.increment("alice", "conv");
        c.increment("alice", "conv");
        c.increment("alice", "conv");
        assert_eq!(c.get("alice", "conv"), 3);

        c.clear("alice", "conv");
        assert_eq!(c.get("alice", "conv"), 0);

        assert_eq!(c.increment("alice", "conv"), 1);
    }

    #[test]
    fn test_stored_value_is_not_capped() {
        let c = counter();
        for _ in 0..100 {
            c.increment("alice", "conv");
        }
        assert_eq!(c.get("alice", "conv"), 100);
        assert_eq!(format_unread(c.get("alice", "conv")), "99+");
    }

    #[test]
    fn test_format_unread_below_cap() {
        assert_eq!(format_unread(0), "0");
        assert_eq!(format_unread(3), "3");
        assert_eq!(format_unread(99), "99");
        assert_eq!(format_unread(100), "99+");
    }

    #[test]
    fn test_clear_absent_is_noop() {
        let c = counter();
        c.clear("alice", "conv");
        assert_eq!(c.get("alice", "conv"), 0);
    }
}
