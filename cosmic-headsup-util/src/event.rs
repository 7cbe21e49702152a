//! Translation of raw notification source events into typed lifecycle events.

use crate::{Notification, NotificationIdentity};

/// An event as emitted by the notification source, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Posted(Notification),
    Changed(Notification),
    /// The source only knows the handle if it saw the notification before.
    Removed {
        id: u32,
        notification: Option<Notification>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Posted,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub identity: NotificationIdentity,
    pub kind: EventKind,
    pub payload: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("notification from '{0}' has id 0")]
    ZeroId(String),
    #[error("removal of unknown notification {0}")]
    UnknownNotification(u32),
}

pub fn normalize(event: RawEvent) -> Result<NormalizedEvent, EventError> {
    let (kind, payload) = match event {
        RawEvent::Posted(n) => (EventKind::Posted, n),
        RawEvent::Changed(n) => (EventKind::Changed, n),
        RawEvent::Removed {
            notification: Some(n),
            ..
        } => (EventKind::Removed, n),
        RawEvent::Removed {
            id,
            notification: None,
        } => return Err(EventError::UnknownNotification(id)),
    };

    if payload.id == 0 {
        return Err(EventError::ZeroId(payload.app_name));
    }

    Ok(NormalizedEvent {
        identity: NotificationIdentity::from(&payload),
        kind,
        payload,
    })
}

/// Turns the active set reported at observer start into synthetic posted
/// events, kept in snapshot order. Malformed entries are logged and skipped.
pub fn normalize_snapshot(snapshot: Vec<Notification>) -> Vec<NormalizedEvent> {
    snapshot
        .into_iter()
        .filter_map(|n| match normalize(RawEvent::Posted(n)) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!("Dropping snapshot entry: {}", err);
                None
            }
        })
        .collect()
}
