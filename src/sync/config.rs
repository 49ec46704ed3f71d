//! Engine configuration

use std::time::Duration;

use crate::core::{DATA_PREFIX, INTEREST_LIFETIME, SYNC_PREFIX, SyncError};
use crate::transport::Jitter;

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Prefix for sync interests and acks.
    pub sync_prefix: String,

    /// Prefix under which application data is named.
    pub data_prefix: String,

    /// Interval between periodic sync interest retransmissions.
    pub retx_jitter: Jitter,

    /// Delay between dispatch ticks and before suppressed acks.
    pub packet_jitter: Jitter,

    /// Lifetime of an outbound interest awaiting its ack.
    pub interest_lifetime: Duration,

    /// Seed for the engine's random source. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_prefix: SYNC_PREFIX.to_string(),
            data_prefix: DATA_PREFIX.to_string(),
            retx_jitter: Jitter::retransmission(),
            packet_jitter: Jitter::packet(),
            interest_lifetime: INTEREST_LIFETIME,
            seed: None,
        }
    }
}

impl SyncConfig {
    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        for (what, prefix) in [("sync", &self.sync_prefix), ("data", &self.data_prefix)] {
            if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
                return Err(SyncError::Config(format!(
                    "{what} prefix must be an absolute name, got {prefix:?}"
                )));
            }
        }
        if self.retx_jitter.max().is_zero() {
            return Err(SyncError::Config(
                "retransmission interval must be positive".to_string(),
            ));
        }
        if self.packet_jitter.max().is_zero() {
            return Err(SyncError::Config("packet delay must be positive".to_string()));
        }
        if self.interest_lifetime.is_zero() {
            return Err(SyncError::Config(
                "interest lifetime must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sync prefix.
    pub fn sync_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sync_prefix = prefix.into();
        self
    }

    /// Set the data prefix.
    pub fn data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.data_prefix = prefix.into();
        self
    }

    /// Set the retransmission interval distribution.
    pub fn retx_jitter(mut self, jitter: Jitter) -> Self {
        self.config.retx_jitter = jitter;
        self
    }

    /// Set the dispatch and suppression delay distribution.
    pub fn packet_jitter(mut self, jitter: Jitter) -> Self {
        self.config.packet_jitter = jitter;
        self
    }

    /// Set the outbound interest lifetime.
    pub fn interest_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.interest_lifetime = lifetime;
        self
    }

    /// Seed the engine's random source.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
