use crate::config;
use crate::constants::{CHANNEL_BUFFER_SIZE, EXIT_ANIMATION_TIMEOUT};
use crate::handlers::{
    Message,
    decay::DecayScheduler,
    gesture::{GestureInterpreter, GestureIntent, PointerSample},
};
use crate::rendering::{AnimationToken, OverlaySurface, Renderer, overlay::DbusOverlay};
use crate::state::{ActivePopupList, OverlayController, OverlaySurfaceState, PopupRecord};
use crate::subscriptions::{
    Environment, NotificationSource, control::EnvironmentState, notifications,
};
use cosmic_headsup_config::HeadsUpConfig;
use cosmic_headsup_util::{
    ActionId, EventKind, Notification, NotificationIdentity, normalize, normalize_snapshot,
};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::Instant;

/// Wires the D-Bus adapters to the engine and runs the control loop until
/// every producer is gone.
pub async fn run() -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

    let (helper, config) = config::load();
    let _watcher = helper.and_then(|helper| config::watch(&helper, tx.clone()));

    let environment = EnvironmentState::default();
    let (source, connection) = notifications::observe(tx.clone(), environment.clone()).await?;
    let overlay = DbusOverlay::spawn(connection);

    let engine = HeadsUp::new(
        config,
        Collaborators {
            renderer: Box::new(overlay.clone()),
            surface: Box::new(overlay),
            source: Box::new(source),
            environment: Box::new(environment),
        },
        tx,
    );
    engine.run(rx).await;
    Ok(())
}

pub struct Collaborators {
    pub renderer: Box<dyn Renderer>,
    pub surface: Box<dyn OverlaySurface>,
    pub source: Box<dyn NotificationSource>,
    pub environment: Box<dyn Environment>,
}

/// The heads-up presentation engine
///
/// Owns the active popups, their decay timers and the overlay state. Every
/// mutation happens in [`HeadsUp::update`] on the control loop; timers,
/// gestures and D-Bus calls only enqueue [`Message`]s.
pub struct HeadsUp {
    config: HeadsUpConfig,
    popups: ActivePopupList,
    overlay: OverlayController,
    renderer: Box<dyn Renderer>,
    source: Box<dyn NotificationSource>,
    environment: Box<dyn Environment>,
    decay: DecayScheduler,
    gestures: GestureInterpreter,
    tx: Sender<Message>,
    /// Home press in progress
    suppressed: bool,
    screen_on: bool,
    power_plugged: bool,
    surface_unavailable: bool,
}

impl HeadsUp {
    pub fn new(config: HeadsUpConfig, collaborators: Collaborators, tx: Sender<Message>) -> Self {
        let Collaborators {
            mut renderer,
            surface,
            source,
            environment,
        } = collaborators;
        renderer.set_theme(config.theme);

        Self {
            config,
            popups: ActivePopupList::new(),
            overlay: OverlayController::new(surface),
            renderer,
            source,
            environment,
            decay: DecayScheduler::new(tx.clone()),
            gestures: GestureInterpreter::new(),
            tx,
            suppressed: false,
            screen_on: true,
            power_plugged: true,
            surface_unavailable: false,
        }
    }

    /// Requests the warm-up snapshot, then runs the control loop.
    pub async fn run(mut self, mut rx: Receiver<Message>) {
        self.source.request_snapshot();
        while let Some(message) = rx.recv().await {
            self.update(message);
        }
        tracing::info!("control loop channel closed");
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Source(event) => match normalize(event) {
                Ok(event) => self.handle_event(event.identity, event.kind, event.payload),
                Err(err) => tracing::warn!("dropping malformed event: {err}"),
            },
            Message::Snapshot(active) => self.reconcile(active),
            Message::Timeout {
                identity,
                generation,
            } => self.on_timer_expired(&identity, generation),
            Message::DetachAnimationComplete(token) => self.on_detach_animation_complete(token),
            Message::Pointer(sample) => self.on_pointer(&sample),
            Message::Dismiss(identity) => self.dismiss(&identity),
            Message::Activate { identity, action } => self.activate(&identity, action),
            Message::Back => self.hide_all(),
            Message::HomePressStart => {
                self.suppressed = true;
                self.hide_all();
            }
            Message::HomePressStop => self.suppressed = false,
            Message::ScreenOn(on) => self.screen_on = on,
            Message::PowerPlugged(plugged) => {
                let was_active = self.is_active();
                self.power_plugged = plugged;
                self.enablement_changed(was_active);
            }
            Message::Config(config) => self.set_config(config),
        }
    }

    pub fn handle_event(
        &mut self,
        identity: NotificationIdentity,
        kind: EventKind,
        payload: Notification,
    ) {
        match kind {
            EventKind::Posted | EventKind::Changed => {
                if self.popups.contains(&identity) {
                    self.update_popup(&identity, payload);
                } else {
                    self.admit(identity, payload);
                }
            }
            EventKind::Removed => {
                self.remove(&identity);
            }
        }
    }

    /// Admits snapshot entries that have no popup yet. Popups already shown
    /// keep their payload and decay deadline.
    fn reconcile(&mut self, active: Vec<Notification>) {
        tracing::debug!("reconciling {} active notifications", active.len());
        for event in normalize_snapshot(active) {
            if self.popups.contains(&event.identity) {
                tracing::trace!(identity = %event.identity, "snapshot entry already shown");
                continue;
            }
            self.handle_event(event.identity, event.kind, event.payload);
        }
    }

    pub fn index_of(&self, identity: &NotificationIdentity) -> Option<usize> {
        self.popups.index_of(identity)
    }

    /// Popups the user swipes away or closes through the overlay.
    pub fn dismiss(&mut self, identity: &NotificationIdentity) {
        if !self.popups.contains(identity) {
            tracing::trace!(%identity, "dismiss for unknown popup");
            return;
        }
        self.source.dismiss(identity);
        self.remove(identity);
    }

    /// Click on the popup body (`action == None`) or on one of its buttons.
    pub fn activate(&mut self, identity: &NotificationIdentity, action: Option<ActionId>) {
        let Some(record) = self.popups.get(identity) else {
            tracing::trace!(%identity, "activation for unknown popup");
            return;
        };

        let action = match action {
            Some(action) if record.payload.has_action(&action) => Some(action),
            Some(action) => {
                tracing::debug!(%identity, %action, "unknown action, using default");
                record.payload.default_action().cloned()
            }
            None => record.payload.default_action().cloned(),
        };

        match action {
            Some(action) => {
                tracing::info!(%identity, %action, "activating notification");
                self.source.activate(identity, action);
            }
            None => self.source.dismiss(identity),
        }
        self.remove(identity);
    }

    pub fn reset_decay(&mut self, identity: &NotificationIdentity) {
        let deadline = Instant::now() + self.config.decay_duration();
        if let Some(record) = self.popups.get_mut(identity) {
            self.decay.reset(&mut record.timer, deadline);
            tracing::trace!(%identity, deadline = ?record.decay_deadline(), "decay reset");
        }
    }

    /// Animates the whole overlay away. Records are released once the exit
    /// animation completes.
    pub fn hide_all(&mut self) {
        self.gestures.reset();
        if self.overlay.state() == OverlaySurfaceState::Detached || self.overlay.is_exiting() {
            return;
        }
        tracing::debug!(popups = ?self.popups.identities(), "hiding overlay");
        self.request_detach();
    }

    fn is_active(&self) -> bool {
        self.config.is_active(self.power_plugged)
    }

    fn admission_blocked(&self) -> Option<&'static str> {
        if self.suppressed {
            Some("home press in progress")
        } else if !self.screen_on {
            Some("screen off")
        } else if !self.is_active() {
            Some("disabled")
        } else if self.config.only_in_fullscreen && !self.environment.is_fullscreen_foreground() {
            Some("foreground is not fullscreen")
        } else {
            None
        }
    }

    fn admit(&mut self, identity: NotificationIdentity, payload: Notification) {
        if let Some(reason) = self.admission_blocked() {
            tracing::debug!(%identity, "not showing popup: {reason}");
            return;
        }

        if let Err(err) = self.overlay.attach() {
            if !self.surface_unavailable {
                tracing::warn!("{err}, dropping popups until it comes back");
            }
            self.surface_unavailable = true;
            return;
        }
        if self.surface_unavailable {
            tracing::info!("overlay surface available again");
            self.surface_unavailable = false;
        }

        let timer = self
            .decay
            .schedule(identity.clone(), Instant::now() + self.config.decay_duration());
        let visual = self.renderer.create_visual(&identity, &payload);
        tracing::debug!(%identity, popups = self.popups.len() + 1, "showing popup");
        self.popups.push(PopupRecord {
            identity,
            payload,
            visual,
            timer,
        });
    }

    fn update_popup(&mut self, identity: &NotificationIdentity, payload: Notification) {
        let deadline = Instant::now() + self.config.decay_duration();
        let Some(record) = self.popups.get_mut(identity) else {
            return;
        };
        self.renderer.update_visual(record.visual, &payload);
        record.payload = payload;
        self.decay.reset(&mut record.timer, deadline);
        tracing::trace!(%identity, "popup updated");
    }

    fn remove(&mut self, identity: &NotificationIdentity) {
        let Some(record) = self.popups.remove(identity) else {
            tracing::trace!(%identity, "removal of unknown popup");
            return;
        };
        self.decay.cancel(record.timer);
        self.renderer.remove_visual(record.visual);
        self.gestures.forget(identity);
        tracing::debug!(%identity, "popup removed");

        if self.popups.is_empty() {
            self.request_detach();
        }
    }

    fn request_detach(&mut self) {
        let Some(token) = self.overlay.detach() else {
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(EXIT_ANIMATION_TIMEOUT).await;
            _ = tx.send(Message::DetachAnimationComplete(token)).await;
        });
    }

    fn on_timer_expired(&mut self, identity: &NotificationIdentity, generation: u64) {
        match self.popups.get(identity) {
            Some(record) if record.timer.generation() == generation => {
                tracing::debug!(%identity, "popup decayed");
                self.source.expired(identity);
                self.remove(identity);
            }
            _ => tracing::trace!(%identity, generation, "stale decay timer"),
        }
    }

    fn on_detach_animation_complete(&mut self, token: AnimationToken) {
        if !self.overlay.is_pending(token) {
            tracing::trace!(token = token.0, "stale exit animation callback");
            return;
        }

        for record in self.popups.drain() {
            self.decay.cancel(record.timer);
            self.renderer.remove_visual(record.visual);
        }
        self.gestures.reset();
        self.overlay.complete(token);
    }

    fn on_pointer(&mut self, sample: &PointerSample) {
        let dismissible = sample
            .target
            .as_ref()
            .and_then(|identity| self.popups.get(identity))
            .is_some_and(|record| record.payload.dismissible());

        let gesture = self.gestures.feed(sample, dismissible);
        if let Some(focus) = &gesture.focus {
            self.reset_decay(focus);
        }

        match gesture.intent {
            GestureIntent::None => {}
            GestureIntent::Dismiss(identity) => self.dismiss(&identity),
            GestureIntent::Expand(identity) => {
                if let Some(record) = self.popups.get(&identity) {
                    self.renderer.expand_visual(record.visual);
                }
            }
            GestureIntent::TapThrough(identity) => self.activate(&identity, None),
            GestureIntent::TouchOutside => {
                if self.config.hide_on_touch_outside {
                    self.hide_all();
                }
            }
        }
    }

    fn set_config(&mut self, config: HeadsUpConfig) {
        let was_active = self.is_active();
        if config.theme != self.config.theme {
            self.renderer.set_theme(config.theme);
        }
        self.config = config;
        self.enablement_changed(was_active);
    }

    fn enablement_changed(&mut self, was_active: bool) {
        match (was_active, self.is_active()) {
            (true, false) => {
                tracing::info!("heads-up disabled");
                self.hide_all();
            }
            (false, true) => tracing::info!("heads-up enabled"),
            _ => {}
        }
    }
}
