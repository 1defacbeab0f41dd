//! Normalized message records.

pub mod kind;
pub mod model;

pub use kind::MessageType;
pub use model::{Attachment, Chat, MessageRecord};

/// Chat id suffix used by group conversations.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Chat id suffix used by one-to-one conversations.
pub const USER_SUFFIX: &str = "@s.whatsapp.net";

/// Id of the synthetic record carrying read receipts.
pub const READ_RECEIPT_ID: &str = "readreceipt";
