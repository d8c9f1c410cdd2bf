//! # Lunaris Runtime
//!
//! Minimal host shell around [`lunaris_creature_anim`]: bootstraps logging
//! and nothing else. The interesting code lives in the `creature_demo`
//! binary, which exercises the animation core end-to-end the way a real
//! engine frame loop would.

#![warn(missing_docs)]
#![warn(clippy::all)]

use lunaris_core::Result;

/// Initializes the runtime shell (logging only).
///
/// # Errors
///
/// Returns an error if the logging subsystem fails to initialize.
pub fn init() -> Result<()> {
    lunaris_core::init()?;
    tracing::info!("Lunaris Runtime initialized");
    Ok(())
}
