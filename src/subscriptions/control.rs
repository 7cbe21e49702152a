use crate::handlers::{
    Message,
    gesture::{PointerPhase, PointerSample},
};
use crate::subscriptions::Environment;
use cosmic_headsup_util::{ActionId, NotificationIdentity};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc::Sender;
use tracing::error;
use zbus::{interface, object_server::SignalEmitter};

/// Foreground state reported by the compositor side. Read by the engine
/// whenever it admits a popup.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentState {
    fullscreen: Arc<AtomicBool>,
}

impl EnvironmentState {
    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::Relaxed);
    }
}

impl Environment for EnvironmentState {
    fn is_fullscreen_foreground(&self) -> bool {
        self.fullscreen.load(Ordering::Relaxed)
    }
}

/// Wire form of an identity: empty `app` with id 0 means "no popup".
fn target(app: &str, id: u32, tag: &str) -> Option<NotificationIdentity> {
    (!app.is_empty() || id != 0).then(|| NotificationIdentity::from_parts(app, id, tag))
}

pub struct HeadsUpControl {
    pub tx: Sender<Message>,
    pub environment: EnvironmentState,
}

impl HeadsUpControl {
    async fn forward(&self, message: Message) -> zbus::fdo::Result<()> {
        self.tx.send(message).await.map_err(|err| {
            error!("Failed to forward control message: {err}");
            zbus::fdo::Error::Failed(err.to_string())
        })
    }
}

#[allow(clippy::too_many_arguments)]
#[interface(name = "com.system76.CosmicHeadsUp")]
impl HeadsUpControl {
    async fn home_press_start(&self) -> zbus::fdo::Result<()> {
        self.forward(Message::HomePressStart).await
    }

    async fn home_press_stop(&self) -> zbus::fdo::Result<()> {
        self.forward(Message::HomePressStop).await
    }

    async fn set_screen_on(&self, on: bool) -> zbus::fdo::Result<()> {
        self.forward(Message::ScreenOn(on)).await
    }

    async fn set_fullscreen(&self, fullscreen: bool) {
        tracing::trace!(fullscreen, "foreground fullscreen state");
        self.environment.set_fullscreen(fullscreen);
    }

    async fn set_power_plugged(&self, plugged: bool) -> zbus::fdo::Result<()> {
        self.forward(Message::PowerPlugged(plugged)).await
    }

    /// phase: 0 down, 1 move, 2 up, 3 cancel, 4 outside
    async fn pointer(
        &self,
        phase: u32,
        app: &str,
        id: u32,
        tag: &str,
        x: f64,
        y: f64,
        width: f64,
        time_ms: u64,
    ) -> zbus::fdo::Result<()> {
        let Some(phase) = PointerPhase::from_code(phase) else {
            return Err(zbus::fdo::Error::InvalidArgs(format!(
                "unknown pointer phase {phase}"
            )));
        };
        self.forward(Message::Pointer(PointerSample {
            phase,
            target: target(app, id, tag),
            x: x as f32,
            y: y as f32,
            width: width as f32,
            time: Duration::from_millis(time_ms),
        }))
        .await
    }

    async fn dismiss(&self, app: &str, id: u32, tag: &str) -> zbus::fdo::Result<()> {
        self.forward(Message::Dismiss(NotificationIdentity::from_parts(app, id, tag)))
            .await
    }

    /// An empty `action` activates the popup itself.
    async fn activate(&self, app: &str, id: u32, tag: &str, action: &str) -> zbus::fdo::Result<()> {
        let action = if action.is_empty() {
            None
        } else {
            action.parse::<ActionId>().ok()
        };
        self.forward(Message::Activate {
            identity: NotificationIdentity::from_parts(app, id, tag),
            action,
        })
        .await
    }

    async fn back(&self) -> zbus::fdo::Result<()> {
        self.forward(Message::Back).await
    }

    async fn detach_animation_complete(&self, token: u64) -> zbus::fdo::Result<()> {
        self.forward(Message::DetachAnimationComplete(
            crate::rendering::AnimationToken(token),
        ))
        .await
    }

    #[zbus(signal)]
    pub async fn visual_created(
        signal_ctxt: &SignalEmitter<'_>,
        handle: u64,
        app: &str,
        id: u32,
        tag: &str,
        app_name: &str,
        icon: &str,
        summary: &str,
        body: &str,
        urgency: u8,
        actions: Vec<&str>,
        dismissible: bool,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn visual_updated(
        signal_ctxt: &SignalEmitter<'_>,
        handle: u64,
        icon: &str,
        summary: &str,
        body: &str,
        urgency: u8,
        actions: Vec<&str>,
        dismissible: bool,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn visual_removed(signal_ctxt: &SignalEmitter<'_>, handle: u64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn visual_expanded(signal_ctxt: &SignalEmitter<'_>, handle: u64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn theme_changed(signal_ctxt: &SignalEmitter<'_>, theme: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn surface_attach(signal_ctxt: &SignalEmitter<'_>) -> zbus::Result<()>;

    /// The overlay plays its exit animation, then calls
    /// `DetachAnimationComplete` with `token`.
    #[zbus(signal)]
    pub async fn surface_detach(signal_ctxt: &SignalEmitter<'_>, token: u64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn surface_detach_cancelled(signal_ctxt: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn surface_destroy(signal_ctxt: &SignalEmitter<'_>) -> zbus::Result<()>;
}
