//! # SVS Sync
//!
//! **S**tate **V**ector **S**ync for named-data networks
//!
//! SVS lets a group of nodes discover each other's newly published data
//! without a broker. Every node gossips a version vector (the highest
//! sequence number it has seen from every node) and learns from the
//! vectors it receives which ranges of data it is missing:
//!
//! - **Convergent**: max-merge makes every exchange idempotent and order
//!   independent
//! - **Loss tolerant**: periodic retransmission recovers from any packet loss
//! - **Storm free**: randomized, cancellable ack suppression
//! - **Transport agnostic**: the engine runs on any [`Transport`]
//!
//! ## Feature Flags
//!
//! - `udp` (default): [`transport::UdpTransport`] over tokio sockets
//!
//! ## Modules
//!
//! - [`core`]: Core traits, constants, and error types
//! - [`sync`]: Version vectors, codec, queues and the sync engine
//! - [`transport`]: Timers, framing and transport implementations
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use svs_sync::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), SyncError> {
//!     let hub = MemoryHub::new();
//!     let engine = SyncEngine::new(
//!         1,
//!         SyncConfig::default(),
//!         Arc::new(hub.endpoint()),
//!         |missing: &[MissingDataInfo]| {
//!             for gap in missing {
//!                 println!("fetch {gap}");
//!             }
//!         },
//!     )?;
//!
//!     engine.start();
//!     assert_eq!(engine.do_update(), 1);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod core;
pub mod sync;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::sync::{
        MergeOutcome, SyncConfig, SyncConfigBuilder, SyncEngine, SyncName, VersionVector,
        data_name,
    };

    pub use crate::transport::{Jitter, MemoryHub, MemoryTransport};

    #[cfg(feature = "udp")]
    pub use crate::transport::UdpTransport;
}

// Re-export commonly used items at crate root
pub use crate::core::{
    MissingDataHandler, MissingDataInfo, NodeId, SeqNo, SyncError, Transport, TransportError,
};
pub use crate::sync::{SyncConfig, SyncConfigBuilder, SyncEngine, VersionVector};
