//! SVS Sync - Sync Layer
//!
//! Implements:
//! - Version vectors with max-merge and gap detection
//! - The textual vector codec and packet naming
//! - Outbound packet queues drained by a paced dispatch loop
//! - The protocol engine: retransmission, ack suppression and
//!   missing-data notification

pub mod codec;
mod config;
mod dispatch;
mod engine;
mod name;
mod packet;
mod pending;
mod queue;
mod vector;

pub use config::*;
pub use dispatch::*;
pub use engine::*;
pub use name::*;
pub use packet::*;
pub use pending::*;
pub use queue::*;
pub use vector::*;
