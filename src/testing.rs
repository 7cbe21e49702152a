//! In-memory collaborators recording every call, for unit tests.

use crate::rendering::{AnimationToken, OverlaySurface, Renderer, SurfaceError, VisualHandle};
use crate::subscriptions::{Environment, NotificationSource};
use cosmic_headsup_config::Theme;
use cosmic_headsup_util::{ActionId, Hint, Notification, NotificationIdentity};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::SystemTime;

pub fn notification(app_name: &str, id: u32) -> Notification {
    Notification {
        id,
        app_name: app_name.to_string(),
        app_icon: "dialog-information".to_string(),
        summary: format!("summary {id}"),
        body: String::new(),
        actions: Vec::new(),
        hints: Vec::new(),
        expire_timeout: -1,
        time: SystemTime::UNIX_EPOCH,
    }
}

pub fn resident(app_name: &str, id: u32) -> Notification {
    let mut n = notification(app_name, id);
    n.hints.push(Hint::Resident(true));
    n
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Create(VisualHandle, NotificationIdentity),
    Update(VisualHandle, String),
    Remove(VisualHandle),
    Expand(VisualHandle),
    Theme(Theme),
}

#[derive(Debug, Clone, Default)]
pub struct FakeRenderer {
    calls: Arc<Mutex<Vec<RenderCall>>>,
    next: Arc<AtomicU64>,
}

impl FakeRenderer {
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Visuals created and not yet removed
    pub fn live(&self) -> Vec<VisualHandle> {
        let mut live = Vec::new();
        for call in self.calls() {
            match call {
                RenderCall::Create(handle, _) => live.push(handle),
                RenderCall::Remove(handle) => live.retain(|h| *h != handle),
                _ => {}
            }
        }
        live
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for FakeRenderer {
    fn create_visual(&mut self, identity: &NotificationIdentity, _payload: &Notification) -> VisualHandle {
        let handle = VisualHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(RenderCall::Create(handle, identity.clone()));
        handle
    }

    fn update_visual(&mut self, handle: VisualHandle, payload: &Notification) {
        self.record(RenderCall::Update(handle, payload.summary.clone()));
    }

    fn remove_visual(&mut self, handle: VisualHandle) {
        self.record(RenderCall::Remove(handle));
    }

    fn expand_visual(&mut self, handle: VisualHandle) {
        self.record(RenderCall::Expand(handle));
    }

    fn set_theme(&mut self, theme: Theme) {
        self.record(RenderCall::Theme(theme));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Attach,
    Detach(AnimationToken),
    CancelDetach,
    Destroy,
}

#[derive(Debug, Clone)]
pub struct FakeSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    available: Arc<AtomicBool>,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl FakeSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: SurfaceCall) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OverlaySurface for FakeSurface {
    fn attach(&mut self) -> Result<(), SurfaceError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(SurfaceError::Unavailable("no overlay client".to_string()));
        }
        self.record(SurfaceCall::Attach);
        Ok(())
    }

    fn detach(&mut self, token: AnimationToken) {
        self.record(SurfaceCall::Detach(token));
    }

    fn cancel_detach(&mut self) {
        self.record(SurfaceCall::CancelDetach);
    }

    fn destroy(&mut self) {
        self.record(SurfaceCall::Destroy);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Dismiss(NotificationIdentity),
    Activate(NotificationIdentity, ActionId),
    Expired(NotificationIdentity),
    Snapshot,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    calls: Arc<Mutex<Vec<SourceCall>>>,
}

impl FakeSource {
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl NotificationSource for FakeSource {
    fn dismiss(&self, identity: &NotificationIdentity) {
        self.calls.lock().unwrap().push(SourceCall::Dismiss(identity.clone()));
    }

    fn activate(&self, identity: &NotificationIdentity, action: ActionId) {
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::Activate(identity.clone(), action));
    }

    fn expired(&self, identity: &NotificationIdentity) {
        self.calls.lock().unwrap().push(SourceCall::Expired(identity.clone()));
    }

    fn request_snapshot(&self) {
        self.calls.lock().unwrap().push(SourceCall::Snapshot);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeEnvironment {
    fullscreen: Arc<AtomicBool>,
}

impl FakeEnvironment {
    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::SeqCst);
    }
}

impl Environment for FakeEnvironment {
    fn is_fullscreen_foreground(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}
