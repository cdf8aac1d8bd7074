//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

use std::time::Duration;

/// Default REST API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";

/// Highest unread count rendered literally; anything above shows as "99+".
/// Display-only - the stored counter is never capped.
pub const UNREAD_DISPLAY_CAP: u32 = 99;

/// How long a "new reply" thread banner stays visible before auto-expiring
pub const THREAD_NOTICE_DURATION: Duration = Duration::from_millis(4500);

/// Default page size for history and thread fetches
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Prefix for locally-assigned provisional message ids (optimistic sends).
/// Server-assigned ids never carry this prefix, so a provisional entry can
/// always be told apart from a confirmed one.
pub const PROVISIONAL_ID_PREFIX: &str = "tmp-";

// Namespaces for the local key-value store. Keys are "{namespace}:{user_id}"
// and each key holds one JSON map of conversation_id -> value.
pub mod kv_ns {
    /// Last-read timestamp per conversation
    pub const READ_STATE: &str = "read_state";
    /// Pending-message count per conversation
    pub const UNREAD: &str = "unread_counts";
    /// "Cleared at" watermark per conversation
    pub const CLEAR_MARKER: &str = "cleared_at";
}
