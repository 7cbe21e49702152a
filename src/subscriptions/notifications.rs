use crate::{
    config::VERSION,
    constants::{CONNECT_ATTEMPTS, HEADSUP_PATH, NOTIFICATIONS_PATH},
    handlers::Message,
    subscriptions::{
        NotificationSource,
        control::{EnvironmentState, HeadsUpControl},
    },
};
use cosmic_headsup_util::{ActionId, CloseReason, Notification, NotificationIdentity, RawEvent};
use std::{collections::HashMap, num::NonZeroU32};
use tokio::{
    sync::mpsc::{Receiver, Sender, channel},
    task::JoinHandle,
};
use tracing::error;

use zbus::{Connection, connection::Builder as ConnectionBuilder, interface, object_server::SignalEmitter};

#[derive(Debug)]
pub struct Conns {
    notifications: Connection,
    pub tx: Sender<Input>,
    rx: Receiver<Input>,
}

impl Conns {
    pub async fn new(output: Sender<Message>, environment: EnvironmentState) -> zbus::Result<Self> {
        let (tx, rx) = channel(100);

        for _ in 0..CONNECT_ATTEMPTS {
            if let Some(conn) = ConnectionBuilder::session()
                .ok()
                .and_then(|conn| conn.name("org.freedesktop.Notifications").ok())
                .and_then(|conn| {
                    conn.serve_at(NOTIFICATIONS_PATH, Notifications::new(tx.clone()))
                        .ok()
                })
                .and_then(|conn| {
                    conn.serve_at(
                        HEADSUP_PATH,
                        HeadsUpControl {
                            tx: output.clone(),
                            environment: environment.clone(),
                        },
                    )
                    .ok()
                })
                .map(ConnectionBuilder::build)
            {
                if let Ok(conn) = conn.await {
                    return Ok(Self {
                        tx,
                        notifications: conn,
                        rx,
                    });
                }
            } else {
                error!("Failed to create connection at {}", NOTIFICATIONS_PATH);
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            }
        }

        Err(zbus::Error::Failure(
            "Failed to create the dbus server".to_string(),
        ))
    }
}

struct Start;
struct Waiting;

/// Forwards the notification server's traffic to the control loop and keeps
/// the set of notifications the source still considers active.
struct Machine<S> {
    output: Sender<Message>,
    active: Vec<Notification>,
    marker: core::marker::PhantomData<S>,
}

impl<S> Machine<S> {
    pub fn new(output: Sender<Message>) -> Self {
        Self {
            output,
            active: Vec::new(),
            marker: core::marker::PhantomData,
        }
    }

    pub fn transition<Next>(self) -> Machine<Next> {
        Machine::<Next> {
            output: self.output,
            active: self.active,
            marker: core::marker::PhantomData,
        }
    }
}

impl Machine<Start> {
    pub async fn exec(self, environment: EnvironmentState) -> zbus::Result<(Machine<Waiting>, Conns)> {
        let output = self.output.clone();
        let handle: JoinHandle<zbus::Result<_>> =
            tokio::spawn(async move { Conns::new(output, environment).await });

        match handle.await {
            Ok(Ok(conns)) => Ok((self.transition::<Waiting>(), conns)),
            Ok(Err(err)) => {
                error!("Failed to create connection {}", err);
                Err(err)
            }
            Err(err) => {
                error!("Failed to create connection {}", err);
                Err(zbus::Error::Failure(err.to_string()))
            }
        }
    }
}

impl Machine<Waiting> {
    /// Stores `notification`, returning the payload it replaced.
    fn upsert(&mut self, notification: Notification) -> Option<Notification> {
        match self.active.iter_mut().find(|n| n.id == notification.id) {
            Some(existing) => Some(std::mem::replace(existing, notification)),
            None => {
                self.active.push(notification);
                None
            }
        }
    }

    fn take(&mut self, id: u32) -> Option<Notification> {
        let pos = self.active.iter().position(|n| n.id == id)?;
        Some(self.active.remove(pos))
    }

    async fn forward(&self, message: Message) {
        if let Err(err) = self.output.send(message).await {
            error!("Failed to forward to the control loop {}", err);
        }
    }

    async fn forward_removed(&mut self, id: u32) {
        match self.take(id) {
            Some(notification) => {
                self.forward(Message::Source(RawEvent::Removed {
                    id,
                    notification: Some(notification),
                }))
                .await
            }
            None => tracing::trace!(id, "close for a notification that is no longer active"),
        }
    }

    /// Handles one input. Returns the close signal the server must emit.
    async fn handle(&mut self, input: Input) -> Option<(u32, CloseReason)> {
        match input {
            Input::Notification(notification) => {
                self.upsert(notification.clone());
                self.forward(Message::Source(RawEvent::Posted(notification))).await;
                None
            }
            Input::Replace(notification) => {
                let identity = NotificationIdentity::from(&notification);
                // A replace that changes the app or stack tag retires the old popup
                let previous = self
                    .upsert(notification.clone())
                    .filter(|previous| NotificationIdentity::from(previous) != identity);
                if let Some(previous) = previous {
                    tracing::debug!(id = notification.id, %identity, "replace changed identity");
                    self.forward(Message::Source(RawEvent::Removed {
                        id: previous.id,
                        notification: Some(previous),
                    }))
                    .await;
                }
                self.forward(Message::Source(RawEvent::Changed(notification))).await;
                None
            }
            Input::CloseNotification(id) => {
                self.forward_removed(id).await;
                Some((id, CloseReason::CloseNotification))
            }
            Input::Dismissed(id) | Input::Activated { id, .. } => {
                self.forward_removed(id).await;
                Some((id, CloseReason::Dismissed))
            }
            Input::Expired(id) => {
                self.take(id);
                None
            }
            Input::Snapshot => {
                let active = self.active.iter().filter(|n| !n.transient()).cloned().collect();
                self.forward(Message::Snapshot(active)).await;
                None
            }
        }
    }

    pub async fn exec(mut self, mut conns: Conns) {
        loop {
            let Some(next) = conns.rx.recv().await else {
                // The channel was closed, so we are done
                return;
            };

            let object_server = conns.notifications.object_server();
            let Ok(iface_ref) = object_server
                .interface::<_, Notifications>(NOTIFICATIONS_PATH)
                .await
            else {
                continue;
            };

            if let Input::Activated { id, action } = &next {
                if let Err(err) =
                    Notifications::action_invoked(iface_ref.signal_emitter(), *id, action).await
                {
                    error!("Failed to signal activated notification {}", err);
                }
                tracing::trace!("Activated application");
            }

            if let Some((id, reason)) = self.handle(next).await {
                if let Err(err) =
                    Notifications::notification_closed(iface_ref.signal_emitter(), id, reason as u32)
                        .await
                {
                    error!("Failed to signal closed notification {}", err);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Activated { id: u32, action: String },
    Notification(Notification),
    Replace(Notification),
    CloseNotification(u32),
    Dismissed(u32),
    /// The popup decayed. Drops the notification without a close signal.
    Expired(u32),
    Snapshot,
}

/// The engine's handle on the notification server.
#[derive(Debug, Clone)]
pub struct SourceHandle {
    tx: Sender<Input>,
}

impl SourceHandle {
    fn send(&self, input: Input) {
        if let Err(err) = self.tx.try_send(input) {
            error!("Failed to reach the notification server {}", err);
        }
    }
}

impl NotificationSource for SourceHandle {
    fn dismiss(&self, identity: &NotificationIdentity) {
        self.send(Input::Dismissed(identity.id));
    }

    fn activate(&self, identity: &NotificationIdentity, action: ActionId) {
        self.send(Input::Activated {
            id: identity.id,
            action: action.to_string(),
        });
    }

    fn expired(&self, identity: &NotificationIdentity) {
        self.send(Input::Expired(identity.id));
    }

    fn request_snapshot(&self) {
        self.send(Input::Snapshot);
    }
}

/// Claims the notifications bus name and starts forwarding to `output`.
/// The returned connection also serves the heads-up control interface.
pub async fn observe(
    output: Sender<Message>,
    environment: EnvironmentState,
) -> anyhow::Result<(SourceHandle, Connection)> {
    let machine = Machine::<Start>::new(output);
    let (waiting, conns) = machine.exec(environment).await?;

    let handle = SourceHandle {
        tx: conns.tx.clone(),
    };
    let connection = conns.notifications.clone();
    tokio::spawn(waiting.exec(conns));

    Ok((handle, connection))
}

pub struct Notifications {
    tx: Sender<Input>,
    next_id: NonZeroU32,
}

impl Notifications {
    fn new(tx: Sender<Input>) -> Self {
        Self {
            tx,
            next_id: NonZeroU32::MIN,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = id.checked_add(1).unwrap_or_else(|| {
            tracing::warn!("Notification ID overflowed");
            NonZeroU32::MIN
        });
        id.get()
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl Notifications {
    async fn close_notification(&self, id: u32) {
        if let Err(err) = self.tx.send(Input::CloseNotification(id)).await {
            tracing::error!("Failed to send close notification: {}", err);
        }
    }

    /// A heads-up daemon only presents popups: no persistence, no sounds.
    async fn get_capabilities(&self) -> Vec<&'static str> {
        vec!["body", "icon-static", "actions"]
    }

    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    async fn get_server_information(
        &self,
    ) -> (&'static str, &'static str, &'static str, &'static str) {
        ("cosmic-headsup", "System76", VERSION, "1.2")
    }

    /// `replaces_id` 0 posts a new notification, anything else updates the
    /// notification with that id in place.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &mut self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> u32 {
        let id = if replaces_id == 0 {
            self.allocate_id()
        } else {
            replaces_id
        };

        let n = Notification::new(
            app_name,
            id,
            app_icon,
            summary,
            body,
            actions,
            hints,
            expire_timeout,
        );

        if let Err(err) = self
            .tx
            .send(if replaces_id == 0 {
                Input::Notification(n)
            } else {
                Input::Replace(n)
            })
            .await
        {
            tracing::error!("Failed to send notification: {}", err);
        }

        id
    }

    #[zbus(signal)]
    async fn action_invoked(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        action_key: &str,
    ) -> zbus::Result<()>;

    /// 1 expired, 2 dismissed by the user, 3 closed through
    /// `CloseNotification`, 4 undefined.
    #[zbus(signal)]
    async fn notification_closed(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        reason: u32,
    ) -> zbus::Result<()>;
}
