use crate::constants::INITIAL_POPUPS_CAPACITY;
use crate::handlers::decay::DecayTimer;
use crate::rendering::VisualHandle;
use cosmic_headsup_util::{Notification, NotificationIdentity};
use tokio::time::Instant;

/// One visible heads-up popup.
#[derive(Debug)]
pub struct PopupRecord {
    pub identity: NotificationIdentity,
    /// Latest content, replaced wholesale on update
    pub payload: Notification,
    pub visual: VisualHandle,
    /// The record's single live decay timer
    pub timer: DecayTimer,
}

impl PopupRecord {
    pub fn decay_deadline(&self) -> Instant {
        self.timer.deadline()
    }
}

/// Ordered list of visible popups
///
/// Insertion order is stacking order. Identities are pairwise distinct; the
/// lifecycle manager looks a record up before it ever inserts one.
#[derive(Debug)]
pub struct ActivePopupList {
    popups: Vec<PopupRecord>,
}

impl ActivePopupList {
    pub fn new() -> Self {
        Self {
            popups: Vec::with_capacity(INITIAL_POPUPS_CAPACITY),
        }
    }

    /// Position of the record matching `identity`, compared by value
    pub fn index_of(&self, identity: &NotificationIdentity) -> Option<usize> {
        self.popups.iter().position(|p| p.identity == *identity)
    }

    pub fn contains(&self, identity: &NotificationIdentity) -> bool {
        self.index_of(identity).is_some()
    }

    pub fn get(&self, identity: &NotificationIdentity) -> Option<&PopupRecord> {
        self.popups.iter().find(|p| p.identity == *identity)
    }

    pub fn get_mut(&mut self, identity: &NotificationIdentity) -> Option<&mut PopupRecord> {
        self.popups.iter_mut().find(|p| p.identity == *identity)
    }

    /// Append a record at the tail (top of the stack)
    pub fn push(&mut self, record: PopupRecord) {
        debug_assert!(
            !self.contains(&record.identity),
            "duplicate popup identity {}",
            record.identity
        );
        self.popups.push(record);
    }

    /// Remove the record matching `identity`, keeping the order of the rest
    pub fn remove(&mut self, identity: &NotificationIdentity) -> Option<PopupRecord> {
        let pos = self.index_of(identity)?;
        let record = self.popups.remove(pos);
        if self.popups.is_empty() {
            self.popups.shrink_to(INITIAL_POPUPS_CAPACITY);
        }
        Some(record)
    }

    /// Remove every record, oldest first
    pub fn drain(&mut self) -> Vec<PopupRecord> {
        self.popups.drain(..).collect()
    }

    pub fn identities(&self) -> Vec<NotificationIdentity> {
        self.popups.iter().map(|p| p.identity.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.popups.len()
    }
}

impl Default for ActivePopupList {
    fn default() -> Self {
        Self::new()
    }
}
