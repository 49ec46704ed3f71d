//! SVS Sync - Core traits, types, and constants.
//!
//! This module provides the foundational types shared by every layer: node
//! identifiers, missing-data ranges, the transport capability the engine is
//! written against, and the error types.

mod constants;
mod error;
mod lock;
mod traits;
mod types;

pub use constants::*;
pub use error::*;
pub(crate) use lock::lock;
pub use traits::*;
pub use types::*;
