//! # Core Error Types
//!
//! Distributor operations never fail (misses are no-ops); these errors cover
//! the fallible edges around it: configuration, policy decoding and the
//! entity pool.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors raised while loading or validating a [`crate::DistributorConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse TOML content.
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// Failed to serialize config to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    /// Parsed values are out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the core crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Policy bitmask carried bits outside the known flags.
    #[error("invalid distributor policy bits: {0:#x}")]
    InvalidPolicyBits(u32),

    /// Entity pool has no free slot left.
    #[error("entity pool exhausted: capacity {capacity}")]
    PoolExhausted {
        /// Pool capacity.
        capacity: usize,
    },

    /// Entity id is not alive (or not parked) in the pool.
    #[error("stale or unknown entity: {0}")]
    StaleEntity(EntityId),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
