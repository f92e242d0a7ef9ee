//! NWScript Bridge
//!
//! Runtime bridge between NWScript programs translated ahead of time into
//! native code and the game host that runs them.
//!
//! Translated code never talks to the host directly. It calls the typed
//! [`Intrinsics`](bridge::Intrinsics) of its script instance, which move
//! values over the instance's operand channel, dispatch action services,
//! hand continuations to the host at suspend points and poll for
//! cancellation after every action.
//!
//! # Example
//!
//! ```no_run
//! use nwscript_bridge::demo::{run_demo, DemoOptions};
//! use nwscript_bridge::util::config::BridgeConfig;
//!
//! fn main() -> nwscript_bridge::Result<()> {
//!     let report = run_demo(&BridgeConfig::default(), &DemoOptions::default())?;
//!     for line in &report.output {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod bridge;
pub mod demo;
pub mod host;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use bridge::{BridgeError, BridgeResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "NWScript Bridge";
