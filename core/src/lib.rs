pub mod config;
pub mod error;
pub mod metrics;
pub mod report;

pub use error::{ErrorCode, ReportError, SettingsError, TopoviewError};
pub use report::{Node, Nodes, Report, Topology};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber, reading directives from `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter_layer);
}

/// Installs the global subscriber with explicit directives, e.g. `AppConfig.log.filter`.
pub fn init_tracing_with(filter: &str) {
    let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter_layer);
}

fn install(filter_layer: EnvFilter) {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    // A second call (e.g. from several tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
