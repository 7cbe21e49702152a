use crate::rendering::{AnimationToken, OverlaySurface, SurfaceError};

/// Whether the shared overlay is presented. A surface playing its exit
/// animation still counts as attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySurfaceState {
    Detached,
    Attached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Detached,
    Attached,
    Exiting(AnimationToken),
}

/// Attach/detach state machine for the single overlay surface
///
/// `Detached --attach--> Attached --detach--> Exiting --complete--> Detached`.
/// Attaching while exiting cancels the exit, detaching while exiting is
/// coalesced into the running exit, and completions carrying anything but the
/// running exit's token are ignored.
pub struct OverlayController {
    phase: Phase,
    surface: Box<dyn OverlaySurface>,
    next_token: u64,
}

impl OverlayController {
    pub fn new(surface: Box<dyn OverlaySurface>) -> Self {
        Self {
            phase: Phase::Detached,
            surface,
            next_token: 1,
        }
    }

    pub fn state(&self) -> OverlaySurfaceState {
        match self.phase {
            Phase::Detached => OverlaySurfaceState::Detached,
            Phase::Attached | Phase::Exiting(_) => OverlaySurfaceState::Attached,
        }
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self.phase, Phase::Exiting(_))
    }

    pub fn attach(&mut self) -> Result<(), SurfaceError> {
        match self.phase {
            Phase::Attached => {}
            Phase::Exiting(token) => {
                tracing::debug!(token = token.0, "attach cancels running exit");
                self.surface.cancel_detach();
                self.phase = Phase::Attached;
            }
            Phase::Detached => {
                self.surface.attach()?;
                tracing::debug!("overlay attached");
                self.phase = Phase::Attached;
            }
        }
        Ok(())
    }

    /// Starts the exit animation. Returns the token of a newly started exit,
    /// `None` when there was nothing to do or an exit already runs.
    pub fn detach(&mut self) -> Option<AnimationToken> {
        match self.phase {
            Phase::Detached => None,
            Phase::Exiting(token) => {
                tracing::trace!(token = token.0, "detach coalesced into running exit");
                None
            }
            Phase::Attached => {
                let token = AnimationToken(self.next_token);
                self.next_token += 1;
                self.surface.detach(token);
                self.phase = Phase::Exiting(token);
                Some(token)
            }
        }
    }

    /// Whether `token` belongs to the exit currently running.
    pub fn is_pending(&self, token: AnimationToken) -> bool {
        self.phase == Phase::Exiting(token)
    }

    /// Finishes the running exit and tears the surface down. Stale tokens
    /// are ignored and reported as `false`.
    pub fn complete(&mut self, token: AnimationToken) -> bool {
        if !self.is_pending(token) {
            tracing::trace!(token = token.0, "stale exit animation callback");
            return false;
        }
        self.surface.destroy();
        self.phase = Phase::Detached;
        tracing::debug!("overlay detached");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSurface, SurfaceCall};

    fn controller() -> (OverlayController, FakeSurface) {
        let surface = FakeSurface::default();
        (OverlayController::new(Box::new(surface.clone())), surface)
    }

    #[test]
    fn test_attach_is_idempotent() {
        let (mut overlay, surface) = controller();
        overlay.attach().unwrap();
        overlay.attach().unwrap();

        assert_eq!(overlay.state(), OverlaySurfaceState::Attached);
        assert_eq!(surface.calls(), vec![SurfaceCall::Attach]);
    }

    #[test]
    fn test_detach_waits_for_completion() {
        let (mut overlay, surface) = controller();
        overlay.attach().unwrap();

        let token = overlay.detach().unwrap();
        assert_eq!(overlay.state(), OverlaySurfaceState::Attached);
        assert!(overlay.is_exiting());

        assert!(overlay.complete(token));
        assert_eq!(overlay.state(), OverlaySurfaceState::Detached);
        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::Attach, SurfaceCall::Detach(token), SurfaceCall::Destroy]
        );
    }

    #[test]
    fn test_second_detach_is_coalesced() {
        let (mut overlay, surface) = controller();
        overlay.attach().unwrap();

        let token = overlay.detach().unwrap();
        assert_eq!(overlay.detach(), None);
        assert_eq!(overlay.detach(), None);

        assert!(overlay.complete(token));
        assert!(!overlay.complete(token), "completion must land exactly once");

        let destroys = surface
            .calls()
            .into_iter()
            .filter(|c| *c == SurfaceCall::Destroy)
            .count();
        assert_eq!(destroys, 1);
    }

    #[test]
    fn test_attach_during_exit_cancels_it() {
        let (mut overlay, surface) = controller();
        overlay.attach().unwrap();
        let token = overlay.detach().unwrap();

        overlay.attach().unwrap();
        assert!(!overlay.is_exiting());
        assert_eq!(overlay.state(), OverlaySurfaceState::Attached);

        // The cancelled exit's completion arrives late
        assert!(!overlay.complete(token));
        assert_eq!(overlay.state(), OverlaySurfaceState::Attached);
        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::Attach, SurfaceCall::Detach(token), SurfaceCall::CancelDetach]
        );
    }

    #[test]
    fn test_each_exit_gets_a_fresh_token() {
        let (mut overlay, _surface) = controller();
        overlay.attach().unwrap();
        let first = overlay.detach().unwrap();
        overlay.attach().unwrap();
        let second = overlay.detach().unwrap();

        assert_ne!(first, second);
        assert!(!overlay.complete(first));
        assert!(overlay.complete(second));
    }

    #[test]
    fn test_detach_when_detached_is_noop() {
        let (mut overlay, surface) = controller();
        assert_eq!(overlay.detach(), None);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_attach_failure_stays_detached() {
        let (mut overlay, surface) = controller();
        surface.set_available(false);

        assert!(matches!(overlay.attach(), Err(SurfaceError::Unavailable(_))));
        assert_eq!(overlay.state(), OverlaySurfaceState::Detached);

        surface.set_available(true);
        overlay.attach().unwrap();
        assert_eq!(overlay.state(), OverlaySurfaceState::Attached);
    }
}
