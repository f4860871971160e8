use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::EmailSender;
use crate::templates::{Notification, compose};

/// Fire-and-forget notification sender.
///
/// With no sender configured every dispatch is a logged no-op.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    sender: Option<Arc<dyn EmailSender>>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Compose and send on a detached task.
    ///
    /// The returned handle may be dropped; the task keeps running. Its
    /// failures end in a `warn!` and never reach the caller.
    pub fn dispatch(&self, notification: &Notification) -> Option<JoinHandle<()>> {
        let Some(sender) = self.sender.clone() else {
            debug!(kind = %notification.kind, "notifications disabled, skipping");
            return None;
        };

        let email = compose(notification);
        let span = info_span!("notify", kind = %notification.kind);
        let handle = tokio::spawn(
            async move {
                match sender.send(&email).await {
                    Ok(id) => info!(message_id = ?id, "notification sent"),
                    Err(e) => warn!(error = %e, "notification failed"),
                }
            }
            .instrument(span),
        );
        Some(handle)
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
