//! D-Bus facing side of the daemon: the freedesktop notification server the
//! engine observes and the control interface the overlay client talks to.

pub mod control;
pub mod notifications;

use cosmic_headsup_util::{ActionId, NotificationIdentity};

/// The notification source as seen by the engine. Calls are fire-and-forget;
/// implementations must not block the control loop.
pub trait NotificationSource: Send {
    /// The user dismissed the notification.
    fn dismiss(&self, identity: &NotificationIdentity);
    /// The user clicked the notification or one of its actions.
    fn activate(&self, identity: &NotificationIdentity, action: ActionId);
    /// The popup decayed. The notification is forgotten without being closed.
    fn expired(&self, identity: &NotificationIdentity);
    /// Ask for a `Message::Snapshot` of every active notification.
    fn request_snapshot(&self);
}

pub trait Environment: Send {
    fn is_fullscreen_foreground(&self) -> bool;
}
