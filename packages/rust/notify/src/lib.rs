//! Stakeholder email notifications.
//!
//! Notifications are a side channel: the [`NotificationDispatcher`] sends on a
//! detached task and only ever logs a failure.

mod dispatcher;
mod resend;
pub mod templates;

use async_trait::async_trait;

use leadline_shared::Result;

pub use dispatcher::NotificationDispatcher;
pub use resend::ResendClient;
pub use templates::{Notification, compose};

/// A rendered email ready for delivery. Sender and recipient come from the
/// [`EmailSender`]'s own settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
}

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Returns the provider's message id when it reports one.
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>>;
}
