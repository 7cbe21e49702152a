use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Notification;

/// Key used to match notifications across posted/changed/removed events.
///
/// Two identities are equal iff package, id and tag all match. The payload a
/// notification carries never takes part in the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationIdentity {
    pub package: String,
    pub id: u32,
    pub tag: Option<String>,
}

impl NotificationIdentity {
    pub fn new(package: impl Into<String>, id: u32, tag: Option<String>) -> Self {
        Self {
            package: package.into(),
            id,
            tag,
        }
    }

    /// Builds an identity from the wire representation used on the control
    /// interface, where an empty tag means "no tag".
    pub fn from_parts(package: &str, id: u32, tag: &str) -> Self {
        Self::new(
            package,
            id,
            if tag.is_empty() {
                None
            } else {
                Some(tag.to_string())
            },
        )
    }

    pub fn tag_str(&self) -> &str {
        self.tag.as_deref().unwrap_or_default()
    }
}

impl From<&Notification> for NotificationIdentity {
    fn from(n: &Notification) -> Self {
        let package = n.desktop_entry().unwrap_or(n.app_name.as_str());
        Self::new(package, n.id, n.stack_tag().map(str::to_string))
    }
}

impl fmt::Display for NotificationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}:{}", self.package, self.id, tag),
            None => write!(f, "{}:{}", self.package, self.id),
        }
    }
}
