//! Tracing setup for the backend binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directives used when `RUST_LOG` is unset. Query-level noise from the
/// ORM and driver stays at warn.
const DEFAULT_DIRECTIVES: &str = "info,sea_orm=warn,sqlx=warn";

/// Install the global subscriber: env-filtered JSON lines on stdout.
/// Call once at startup, before the server binds.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(false).json())
        .init();
}
