use serde::{Deserialize, Serialize};

/// Kind of conversation a message belongs to.
///
/// Only used to pick the push event family (channel vs DM events share the
/// same payload shape but different names); conversation ids stay opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Channel,
    Direct,
    Group,
}

impl ConversationKind {
    /// Direct and group conversations use the DM event family on the socket
    pub fn is_dm(&self) -> bool {
        matches!(self, ConversationKind::Direct | ConversationKind::Group)
    }
}
