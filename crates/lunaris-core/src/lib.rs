//! # Lunaris Core
//!
//! Core utilities, types, and foundational abstractions for the Lunaris Game Engine.
//!
//! This crate provides:
//! - Common error types and result aliases
//! - Logging and tracing infrastructure
//! - Frame timing
//! - Resource handles and identifiers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod id;
pub mod logger;
pub mod time;

pub use error::{Error, Result};
pub use id::{Id, TypedId};
pub use logger::{LogLevel, Logger};
pub use time::Time;

/// Lunaris Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize core systems (logging, etc.)
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., logging already initialized)
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    tracing::info!("Lunaris Engine v{VERSION} initialized");
    Ok(())
}
