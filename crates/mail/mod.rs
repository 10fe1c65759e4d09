//! Outgoing mail. Use cases hand messages to a [`MailDispatcher`]; delivery
//! happens in the background and never blocks or fails the caller.

mod queue;
mod transport;

use chrono::{DateTime, Utc};
use mockall::automock;
use serde::Serialize;
use serde_json::Value;

pub use queue::MailQueue;
pub use transport::{LogTransport, MailTransport, RelayTransport};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "user_id", rename_all = "lowercase")]
pub enum MailRecipient {
    User(i32),
    /// The support staff mailbox.
    Staff,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingMail {
    pub recipient: MailRecipient,
    pub template: String,
    pub payload: Value,
    pub queued_at: DateTime<Utc>,
}

#[automock]
pub trait MailDispatcher: Send + Sync {
    fn send(&self, recipient: MailRecipient, template: &str, payload: Value);
}
