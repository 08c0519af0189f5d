//! Tracing subscriber setup

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` is honoured; `default_directive` (e.g. `"info"` or
/// `"tw_messages=debug"`) is added on top of it. Returns an error if a
/// global subscriber is already installed.
pub fn init(default_directive: &str) -> Result<()> {
    let directive: Directive = default_directive
        .parse()
        .map_err(|e| Error::Logging(format!("Invalid directive '{}': {}", default_directive, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
