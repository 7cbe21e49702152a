use crate::handlers::gesture::PointerSample;
use crate::rendering::AnimationToken;
use cosmic_headsup_config::HeadsUpConfig;
use cosmic_headsup_util::{ActionId, Notification, NotificationIdentity, RawEvent};

/// Everything the control loop reacts to. Every producer (D-Bus handlers,
/// timers, the config watcher) only ever enqueues one of these.
#[derive(Debug, Clone)]
pub enum Message {
    /// Lifecycle event from the notification source
    Source(RawEvent),
    /// Active notifications at observer start, oldest first
    Snapshot(Vec<Notification>),
    /// Decay timer fired
    Timeout {
        identity: NotificationIdentity,
        generation: u64,
    },
    /// Exit animation finished (or its fallback timer fired)
    DetachAnimationComplete(AnimationToken),
    /// Pointer sample from the overlay
    Pointer(PointerSample),
    /// Notification dismissed by the user
    Dismiss(NotificationIdentity),
    /// Popup clicked, or one of its action buttons
    Activate {
        identity: NotificationIdentity,
        action: Option<ActionId>,
    },
    /// Back key pressed while the overlay is shown
    Back,
    HomePressStart,
    HomePressStop,
    ScreenOn(bool),
    PowerPlugged(bool),
    /// Configuration updated
    Config(HeadsUpConfig),
}
