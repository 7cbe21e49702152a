pub mod event;
pub mod identity;
pub mod urgency;

pub use event::{EventError, EventKind, NormalizedEvent, RawEvent, normalize, normalize_snapshot};
pub use identity::NotificationIdentity;
pub use urgency::NotificationUrgency;

use serde::{Deserialize, Serialize};
#[cfg(feature = "zbus_notifications")]
use std::collections::HashMap;
use std::{convert::Infallible, fmt, path::PathBuf, str::FromStr, time::SystemTime};

/// Hints carrying a stacking tag. Notifications sharing a tag describe the
/// same logical event (volume OSDs, progress updates).
pub const STACK_TAG_HINTS: [&str; 2] = ["x-dunst-stack-tag", "x-canonical-private-synchronous"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<(ActionId, String)>,
    pub hints: Vec<Hint>,
    pub expire_timeout: i32,
    pub time: SystemTime,
}

impl Notification {
    #[allow(clippy::too_many_arguments)]
    #[cfg(feature = "zbus_notifications")]
    pub fn new(
        app_name: &str,
        id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> Self {
        if actions.len() % 2 != 0 {
            tracing::warn!("Odd action list from '{}', ignoring trailing entry", app_name);
        }
        let actions = actions
            .chunks_exact(2)
            .filter_map(|a| Some((a[0].parse::<ActionId>().ok()?, a[1].to_string())))
            .collect();

        let hints = hints
            .into_iter()
            .filter_map(|(k, v)| match k {
                "category" => String::try_from(v).map(Hint::Category).ok(),
                "desktop-entry" => String::try_from(v).map(Hint::DesktopEntry).ok(),
                "resident" => bool::try_from(v).map(Hint::Resident).ok(),
                "transient" => bool::try_from(v).map(Hint::Transient).ok(),
                "urgency" => u8::try_from(v).map(Hint::Urgency).ok(),
                k if STACK_TAG_HINTS.contains(&k) => String::try_from(v).map(Hint::StackTag).ok(),
                "image-path" | "image_path" => String::try_from(v).ok().map(|s| {
                    Hint::Image(
                        url::Url::parse(&s)
                            .ok()
                            .and_then(|u| u.to_file_path().ok())
                            .map(Image::File)
                            .or_else(|| {
                                if s.starts_with('/') {
                                    Some(Image::File(PathBuf::from(&s)))
                                } else {
                                    None
                                }
                            })
                            .unwrap_or_else(|| Image::Name(s)),
                    )
                }),
                _ => {
                    tracing::trace!("Ignoring hint: {}", k);
                    None
                }
            })
            .collect();

        Notification {
            id,
            app_name: app_name.to_string(),
            app_icon: app_icon.to_string(),
            summary: summary.to_string(),
            body: body.to_string(),
            actions,
            hints,
            expire_timeout,
            time: SystemTime::now(),
        }
    }

    pub fn transient(&self) -> bool {
        self.hints.iter().any(|h| *h == Hint::Transient(true))
    }

    /// Resident notifications stay around after interaction, so a swipe must
    /// not dismiss them.
    pub fn dismissible(&self) -> bool {
        !self.hints.iter().any(|h| *h == Hint::Resident(true))
    }

    pub fn category(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::Category(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn desktop_entry(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::DesktopEntry(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn stack_tag(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::StackTag(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn urgency(&self) -> NotificationUrgency {
        self.hints
            .iter()
            .find_map(|h| match h {
                Hint::Urgency(u) => Some(NotificationUrgency::from(*u)),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn image(&self) -> Option<&Image> {
        self.hints.iter().find_map(|h| match h {
            Hint::Image(i) => Some(i),
            _ => None,
        })
    }

    /// Icon to show on the popup: the image hint when it names a file or an
    /// icon, the application icon otherwise.
    pub fn icon(&self) -> &str {
        match self.image() {
            Some(Image::Name(name)) => name.as_str(),
            Some(Image::File(path)) => path.to_str().unwrap_or(&self.app_icon),
            None => self.app_icon.as_str(),
        }
    }

    /// The action triggered by a plain click on the popup, if the sender
    /// offered one.
    pub fn default_action(&self) -> Option<&ActionId> {
        self.actions
            .iter()
            .map(|(id, _)| id)
            .find(|id| matches!(id, ActionId::Default))
            .or_else(|| self.actions.first().map(|(id, _)| id))
    }

    pub fn has_action(&self, action: &ActionId) -> bool {
        self.actions.iter().any(|(id, _)| id == action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    Default,
    Custom(String),
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Default => write!(f, "default"),
            ActionId::Custom(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for ActionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => ActionId::Default,
            s => ActionId::Custom(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hint {
    Category(String),
    DesktopEntry(String),
    Image(Image),
    Resident(bool),
    StackTag(String),
    Transient(bool),
    Urgency(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Image {
    Name(String),
    File(PathBuf),
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    Expired = 1,
    Dismissed = 2,
    CloseNotification = 3,
    Undefined = 4,
}

#[cfg(test)]
pub(crate) fn test_notification(app_name: &str, id: u32, hints: Vec<Hint>) -> Notification {
    Notification {
        id,
        app_name: app_name.to_string(),
        app_icon: "dialog-information".to_string(),
        summary: format!("summary {id}"),
        body: String::new(),
        actions: Vec::new(),
        hints,
        expire_timeout: -1,
        time: SystemTime::UNIX_EPOCH,
    }
}
