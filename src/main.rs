mod app;
mod config;
mod constants;
mod handlers;
mod rendering;
mod state;
mod subscriptions;
#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    init_logging();

    info!("cosmic-headsup ({})", config::VERSION);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cosmic_headsup=info"));

    #[cfg(feature = "systemd")]
    if let Ok(journald) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter)
            .with(journald)
            .init();
        return;
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
