use crate::handlers::Message;
use cosmic_config::{Config, CosmicConfigEntry};
use cosmic_headsup_config::{HeadsUpConfig, ID};
use tokio::sync::mpsc::Sender;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reads the stored configuration, falling back to defaults for anything
/// missing or unreadable.
pub fn load() -> (Option<Config>, HeadsUpConfig) {
    let helper = match Config::new(ID, HeadsUpConfig::VERSION) {
        Ok(helper) => Some(helper),
        Err(err) => {
            tracing::error!("Failed to open config {ID}: {err:?}");
            None
        }
    };

    let config = helper
        .as_ref()
        .map(|helper| {
            HeadsUpConfig::get_entry(helper).unwrap_or_else(|(errors, config)| {
                for err in errors {
                    if err.is_err() {
                        tracing::error!("{:?}", err);
                    }
                }
                config
            })
        })
        .unwrap_or_default();

    (helper, config)
}

/// Pushes every config change to the control loop. The returned watcher must
/// be kept alive.
pub fn watch(helper: &Config, tx: Sender<Message>) -> Option<impl Sized + use<>> {
    let watcher = helper.watch(move |helper, keys| {
        tracing::debug!("config keys changed: {keys:?}");
        let config = HeadsUpConfig::get_entry(helper).unwrap_or_else(|(errors, config)| {
            for err in errors {
                if err.is_err() {
                    tracing::error!("{:?}", err);
                }
            }
            config
        });
        if let Err(err) = tx.try_send(Message::Config(config)) {
            tracing::error!("Failed to forward config update: {err}");
        }
    });

    match watcher {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::error!("Failed to watch config {ID}: {err:?}");
            None
        }
    }
}
