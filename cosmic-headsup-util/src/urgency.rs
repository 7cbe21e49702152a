/// Notification urgency level as defined by the freedesktop.org specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NotificationUrgency {
    Low = 0,
    #[default]
    Normal = 1,
    /// Critical popups are rendered with the alert style by the overlay.
    Critical = 2,
}

impl From<u8> for NotificationUrgency {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Low,
            2 => Self::Critical,
            _ => Self::Normal,
        }
    }
}
