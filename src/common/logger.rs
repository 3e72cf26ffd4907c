//! Logging setup for the chat relay binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `default_level` applies to both the library crate and the named binary
/// unless `RUST_LOG` overrides the filter.
pub fn setup_logger(binary_name: &str, default_level: &str) {
    let default_filter = format!(
        "{lib}={level},{bin}={level}",
        lib = env!("CARGO_PKG_NAME").replace('-', "_"),
        bin = binary_name.replace('-', "_"),
        level = default_level,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
