pub mod clear_marker;
pub mod kv;
pub mod read_state;
pub mod reconciler;
pub mod unread;

pub use clear_marker::ClearMarkerStore;
pub use kv::{FileKvStore, InMemoryKvStore, KvStore};
pub use read_state::ReadStateTracker;
pub use reconciler::{derive_view, MessageReconciler};
pub use unread::{format_unread, UnreadCounter};
