// Constants module for cosmic-headsup
// Centralizes magic numbers for better maintainability

use std::time::Duration;

// ============================================================================
// Overlay Constants
// ============================================================================

/// How long the overlay may take to report its exit animation finished
/// before the engine tears it down anyway
pub(crate) const EXIT_ANIMATION_TIMEOUT: Duration = Duration::from_millis(1000);

/// Initial capacity for the active popup list
pub(crate) const INITIAL_POPUPS_CAPACITY: usize = 8;

// ============================================================================
// Gesture Constants (logical pixels)
// ============================================================================

/// Movement below this distance still counts as a tap
pub(crate) const TOUCH_SLOP: f32 = 16.0;

/// Fraction of the popup width a horizontal drag must cover to dismiss it
pub(crate) const DISMISS_DISTANCE_FRACTION: f32 = 0.4;

/// Horizontal fling speed (px/s) that dismisses regardless of distance
pub(crate) const SWIPE_ESCAPE_VELOCITY: f32 = 100.0;

/// Downward drag distance that expands a popup
pub(crate) const EXPAND_DISTANCE: f32 = 48.0;

// ============================================================================
// Channel and Buffer Constants
// ============================================================================

/// Buffer size for the control loop channel
pub(crate) const CHANNEL_BUFFER_SIZE: usize = 100;

/// Buffer size for the overlay command channel
pub(crate) const OVERLAY_BUFFER_SIZE: usize = 100;

// ============================================================================
// D-Bus Constants
// ============================================================================

pub(crate) const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";

pub(crate) const HEADSUP_PATH: &str = "/com/system76/CosmicHeadsUp";

/// Attempts at claiming the notifications bus name before giving up
pub(crate) const CONNECT_ATTEMPTS: usize = 5;
