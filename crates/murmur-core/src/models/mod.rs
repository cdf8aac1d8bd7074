pub mod conversation;
pub mod message;
pub mod thread;

pub use conversation::ConversationKind;
pub use message::{Attachment, Delivery, Message, Poll, PollOption, Reaction};
pub use thread::{ReplyNotice, ThreadState};

pub(crate) use message::now_millis;
