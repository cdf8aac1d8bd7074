/// Errors surfaced by user-initiated chat operations.
///
/// Local-storage failures are deliberately absent: per the error policy the
/// key-value store treats them as "no stored state" and never raises them.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// REST request rejected or failed at the transport level
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Push emit failed, acknowledgement missing, or transport unavailable
    #[error("push transport error: {0}")]
    Transport(String),

    /// Server payload could not be decoded, or decoded into an invalid
    /// entity (e.g. missing id). Raised at the decode site so a malformed
    /// record never reaches the reconciler.
    #[error("malformed server payload: {0}")]
    Data(String),

    /// Operation referenced a message the local set does not hold
    #[error("unknown message id: {0}")]
    UnknownMessage(String),

    /// Retry requested for a message that is not in the Failed state
    #[error("message {0} is not awaiting retry")]
    NotRetryable(String),
}

impl ChatError {
    /// Transport-class errors are shown to the user as a transient banner;
    /// data errors indicate a server/client contract violation.
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatError::Http(_) | ChatError::Transport(_))
    }
}
