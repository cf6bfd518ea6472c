//! Defines an abstraction over the event sending mechanism.

use super::events::UserEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of user events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

/// The channel a front end's event loop drains.
impl EventProxy for UnboundedSender<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // A closed receiver means the front end is gone; the worker finishes
        // regardless, so there is nothing to do beyond noting it.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to send event to event loop: {}", e);
        }
    }
}
