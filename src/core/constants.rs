//! Protocol constants.
//!
//! Defaults for naming and timing. Everything timing-related can be
//! overridden through [`SyncConfig`](crate::sync::SyncConfig).

use std::time::Duration;

// =============================================================================
// NAMING
// =============================================================================

/// Prefix under which sync interests and acks are exchanged.
pub const SYNC_PREFIX: &str = "/ndn/svs/syncNotify";

/// Prefix under which application data is published.
pub const DATA_PREFIX: &str = "/ndn/svs/vsyncData";

/// Fragment component appended to every data name.
pub const DATA_FRAGMENT: u64 = 0;

/// Separator between the entries of an encoded version vector.
pub const VECTOR_ENTRY_SEPARATOR: char = '_';

/// Separator between node id and sequence number inside one entry.
pub const VECTOR_PAIR_SEPARATOR: char = '-';

// =============================================================================
// TIMING
// =============================================================================

/// Mean interval between periodic sync interest retransmissions.
pub const RETX_INTERVAL_MEAN: Duration = Duration::from_millis(3000);

/// Maximum deviation from [`RETX_INTERVAL_MEAN`] (10%).
pub const RETX_INTERVAL_SPREAD: Duration = Duration::from_millis(300);

/// Mean delay between dispatch ticks, also used for ack suppression.
pub const PACKET_DELAY_MEAN: Duration = Duration::from_micros(12_500);

/// Maximum deviation from [`PACKET_DELAY_MEAN`].
pub const PACKET_DELAY_SPREAD: Duration = Duration::from_micros(2_500);

/// Lifetime of an outbound sync interest awaiting its ack.
pub const INTEREST_LIFETIME: Duration = Duration::from_millis(1000);

// =============================================================================
// WIRE
// =============================================================================

/// Frame kind carried by sync interests.
pub const FRAME_KIND_INTEREST: u8 = 0x01;

/// Frame kind carried by data packets (sync acks).
pub const FRAME_KIND_DATA: u8 = 0x02;

/// Largest datagram the UDP transport will emit.
pub const MAX_DATAGRAM_SIZE: usize = 8800;
