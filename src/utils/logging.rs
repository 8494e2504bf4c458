//! Logging setup
//!
//! The library only emits `tracing` events; binaries and tests install a
//! subscriber with this helper.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Setup logging with the specified level
///
/// `RUST_LOG` takes precedence over `level`. Installing twice is a no-op.
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_setup_is_idempotent() {
        setup_logging("debug");
        setup_logging("info");
        tracing::debug!("logging initialised");
    }
}
