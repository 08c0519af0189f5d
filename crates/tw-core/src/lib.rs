//! tw-core: shared configuration, errors and logging for tw-gateway
//!
//! Holds the account context (`TwilioConfig`) that the messaging crates
//! receive at construction time, plus the tracing subscriber setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::TwilioConfig;
pub use error::{Error, Result};
