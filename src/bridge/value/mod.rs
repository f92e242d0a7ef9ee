//! Operand values exchanged between translated scripts and the host
//!
//! This module provides the five operand kinds that cross the bridge and
//! the small value types (object ids, vectors) built from them.

pub mod operand;
pub use operand::*;

#[cfg(test)]
mod tests;
