//! Renderer and overlay surface backed by the out-of-process overlay client.
//!
//! Calls never block the control loop: each one is queued as an
//! [`OverlayCommand`] and a single task turns the queue into
//! `com.system76.CosmicHeadsUp` signals, in call order.

use super::{AnimationToken, OverlaySurface, Renderer, SurfaceError, VisualHandle};
use crate::constants::{HEADSUP_PATH, OVERLAY_BUFFER_SIZE};
use crate::subscriptions::control::HeadsUpControl;
use cosmic_headsup_config::Theme;
use cosmic_headsup_util::{Notification, NotificationIdentity};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::mpsc::{Receiver, Sender, channel, error::TrySendError};
use tracing::error;
use zbus::{Connection, object_server::SignalEmitter};

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    Created {
        handle: VisualHandle,
        identity: NotificationIdentity,
        payload: Notification,
    },
    Updated {
        handle: VisualHandle,
        payload: Notification,
    },
    Removed(VisualHandle),
    Expanded(VisualHandle),
    Theme(Theme),
    Attach,
    Detach(AnimationToken),
    CancelDetach,
    Destroy,
}

/// Freedesktop style flat list: id, label, id, label, ...
fn flat_actions(payload: &Notification) -> Vec<String> {
    payload
        .actions
        .iter()
        .flat_map(|(id, label)| [id.to_string(), label.clone()])
        .collect()
}

impl OverlayCommand {
    async fn emit(self, emitter: &SignalEmitter<'_>) -> zbus::Result<()> {
        match self {
            OverlayCommand::Created {
                handle,
                identity,
                payload,
            } => {
                let actions = flat_actions(&payload);
                HeadsUpControl::visual_created(
                    emitter,
                    handle.0,
                    &identity.package,
                    identity.id,
                    identity.tag_str(),
                    &payload.app_name,
                    payload.icon(),
                    &payload.summary,
                    &payload.body,
                    payload.urgency() as u8,
                    actions.iter().map(String::as_str).collect(),
                    payload.dismissible(),
                )
                .await
            }
            OverlayCommand::Updated { handle, payload } => {
                let actions = flat_actions(&payload);
                HeadsUpControl::visual_updated(
                    emitter,
                    handle.0,
                    payload.icon(),
                    &payload.summary,
                    &payload.body,
                    payload.urgency() as u8,
                    actions.iter().map(String::as_str).collect(),
                    payload.dismissible(),
                )
                .await
            }
            OverlayCommand::Removed(handle) => HeadsUpControl::visual_removed(emitter, handle.0).await,
            OverlayCommand::Expanded(handle) => {
                HeadsUpControl::visual_expanded(emitter, handle.0).await
            }
            OverlayCommand::Theme(theme) => HeadsUpControl::theme_changed(emitter, theme.as_str()).await,
            OverlayCommand::Attach => HeadsUpControl::surface_attach(emitter).await,
            OverlayCommand::Detach(token) => HeadsUpControl::surface_detach(emitter, token.0).await,
            OverlayCommand::CancelDetach => HeadsUpControl::surface_detach_cancelled(emitter).await,
            OverlayCommand::Destroy => HeadsUpControl::surface_destroy(emitter).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbusOverlay {
    tx: Sender<OverlayCommand>,
    next_handle: Arc<AtomicU64>,
}

impl DbusOverlay {
    pub fn new() -> (Self, Receiver<OverlayCommand>) {
        let (tx, rx) = channel(OVERLAY_BUFFER_SIZE);
        (
            Self {
                tx,
                next_handle: Arc::new(AtomicU64::new(1)),
            },
            rx,
        )
    }

    /// Emits queued commands on `conn`, which must serve [`HeadsUpControl`].
    pub fn spawn(conn: Connection) -> Self {
        let (overlay, rx) = Self::new();
        tokio::spawn(emit_commands(conn, rx));
        overlay
    }

    fn send(&self, command: OverlayCommand) -> Result<(), SurfaceError> {
        self.tx.try_send(command).map_err(|err| match err {
            TrySendError::Full(command) => {
                error!("Overlay command queue full, dropping {command:?}");
                SurfaceError::Unavailable("overlay command queue full".to_string())
            }
            TrySendError::Closed(_) => {
                SurfaceError::Unavailable("overlay signal task stopped".to_string())
            }
        })
    }

    fn queue(&self, command: OverlayCommand) {
        if let Err(err) = self.send(command) {
            tracing::debug!("{err}");
        }
    }
}

async fn emit_commands(conn: Connection, mut rx: Receiver<OverlayCommand>) {
    let object_server = conn.object_server();
    let iface_ref = match object_server
        .interface::<_, HeadsUpControl>(HEADSUP_PATH)
        .await
    {
        Ok(iface_ref) => iface_ref,
        Err(err) => {
            error!("Failed to find the heads-up control interface {}", err);
            return;
        }
    };

    while let Some(command) = rx.recv().await {
        if let Err(err) = command.emit(iface_ref.signal_emitter()).await {
            error!("Failed to signal overlay {}", err);
        }
    }
}

impl Renderer for DbusOverlay {
    fn create_visual(&mut self, identity: &NotificationIdentity, payload: &Notification) -> VisualHandle {
        let handle = VisualHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.queue(OverlayCommand::Created {
            handle,
            identity: identity.clone(),
            payload: payload.clone(),
        });
        handle
    }

    fn update_visual(&mut self, handle: VisualHandle, payload: &Notification) {
        self.queue(OverlayCommand::Updated {
            handle,
            payload: payload.clone(),
        });
    }

    fn remove_visual(&mut self, handle: VisualHandle) {
        self.queue(OverlayCommand::Removed(handle));
    }

    fn expand_visual(&mut self, handle: VisualHandle) {
        self.queue(OverlayCommand::Expanded(handle));
    }

    fn set_theme(&mut self, theme: Theme) {
        self.queue(OverlayCommand::Theme(theme));
    }
}

impl OverlaySurface for DbusOverlay {
    fn attach(&mut self) -> Result<(), SurfaceError> {
        self.send(OverlayCommand::Attach)
    }

    fn detach(&mut self, token: AnimationToken) {
        self.queue(OverlayCommand::Detach(token));
    }

    fn cancel_detach(&mut self) {
        self.queue(OverlayCommand::CancelDetach);
    }

    fn destroy(&mut self) {
        self.queue(OverlayCommand::Destroy);
    }
}
