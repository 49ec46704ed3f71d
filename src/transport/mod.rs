//! SVS Sync - Transport Layer
//!
//! Everything the engine needs below the protocol:
//!
//! - **Timing**: [`Jitter`] delay distributions and cancellable [`Timer`]s
//! - **Framing**: [`Frame`] datagram encoding
//! - **In-process transport**: [`MemoryHub`] and [`MemoryTransport`], with
//!   loss injection for tests and simulations
//! - **UDP transport**: [`UdpTransport`] over tokio sockets (`udp` feature)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Sync Layer                   │
//! ├─────────────────────────────────────────┤
//! │     Transport trait (core::traits)      │
//! ├────────────────────┬────────────────────┤
//! │   MemoryTransport  │    UdpTransport    │  ← This module
//! └────────────────────┴────────────────────┘
//! ```

mod frame;
mod memory;
#[cfg(feature = "udp")]
mod socket;
mod timer;
mod timing;

pub use frame::*;
pub use memory::*;
#[cfg(feature = "udp")]
#[cfg_attr(docsrs, doc(cfg(feature = "udp")))]
pub use socket::*;
pub use timer::*;
pub use timing::*;
