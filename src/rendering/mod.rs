//! Boundary between the engine and whatever draws the popups.
//!
//! The engine never renders anything itself. It tells a [`Renderer`] which
//! popup visuals exist and an [`OverlaySurface`] when the shared overlay must
//! be shown or hidden. The daemon implements both over D-Bus in [`overlay`].

pub mod overlay;

use cosmic_headsup_config::Theme;
use cosmic_headsup_util::{Notification, NotificationIdentity};

/// Opaque handle to one popup visual, allocated by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// Tags one exit animation so a late completion for an older one is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("overlay surface unavailable: {0}")]
    Unavailable(String),
}

pub trait Renderer: Send {
    fn create_visual(&mut self, identity: &NotificationIdentity, payload: &Notification) -> VisualHandle;
    fn update_visual(&mut self, handle: VisualHandle, payload: &Notification);
    fn remove_visual(&mut self, handle: VisualHandle);
    fn expand_visual(&mut self, handle: VisualHandle);
    fn set_theme(&mut self, theme: Theme);
}

pub trait OverlaySurface: Send {
    /// Registers the overlay and plays its enter animation.
    fn attach(&mut self) -> Result<(), SurfaceError>;
    /// Starts the exit animation. Completion must be reported back with the
    /// same token.
    fn detach(&mut self, token: AnimationToken);
    /// Aborts a running exit animation, leaving the overlay shown.
    fn cancel_detach(&mut self);
    /// Unregisters the overlay once its exit animation has finished.
    fn destroy(&mut self);
}
