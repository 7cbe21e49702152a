use cosmic_config::{CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use std::time::Duration;

pub const ID: &str = "com.system76.CosmicHeadsUp";

/// Lower bound applied to `decay_time` so a zero or tiny value can't retire
/// popups before they are drawn.
pub const MIN_DECAY_TIME: u32 = 500;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, CosmicConfigEntry)]
#[version = 1]
pub struct HeadsUpConfig {
    /// Whether heads-up popups are shown at all.
    pub enabled: bool,
    pub theme: Theme,
    /// Time in milliseconds a popup stays on screen without interaction.
    pub decay_time: u32,
    /// Only admit new popups while the foreground app is fullscreen.
    pub only_in_fullscreen: bool,
    /// Hide the whole overlay when the user touches outside of it.
    pub hide_on_touch_outside: bool,
    /// Only show popups while the device is plugged in (default: false)
    #[serde(default)]
    pub only_while_charging: bool,
}

impl Default for HeadsUpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: Theme::default(),
            decay_time: default_decay_time(),
            only_in_fullscreen: false,
            hide_on_touch_outside: true,
            only_while_charging: false,
        }
    }
}

impl HeadsUpConfig {
    /// The configured decay as a [`Duration`], clamped to [`MIN_DECAY_TIME`].
    pub fn decay_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.decay_time.max(MIN_DECAY_TIME)))
    }

    /// Whether popups may be shown given the current power state.
    pub fn is_active(&self, power_plugged: bool) -> bool {
        self.enabled && (!self.only_while_charging || power_plugged)
    }
}

const fn default_decay_time() -> u32 {
    5000
}
