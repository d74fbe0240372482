//! # Distributor Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! [policy]
//! enabled = true
//! order = "priority_first"   # or "entity_first"
//! resort = "lazy"            # or "always"
//!
//! [pool]
//! capacity = 256
//!
//! [dispatch]
//! scratch_capacity = 64
//! ```
//!
//! Every section and key is optional; missing values fall back to defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distributor::{DistributorPolicy, DEFAULT_POOL_CAPACITY, DEFAULT_SCRATCH_CAPACITY};
use crate::error::ConfigError;

/// Largest pool the salted 16-bit entity index can address.
pub const MAX_POOL_CAPACITY: usize = u16::MAX as usize + 1;

/// Entity pool section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pooled entity slots; also bounds pending remaps.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Dispatch section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Initial capacity of the reusable dispatch buffer.
    pub scratch_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
        }
    }
}

/// Complete distributor configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributorConfig {
    /// Dispatch policy.
    pub policy: DistributorPolicy,
    /// Entity pool sizing.
    pub pool: PoolConfig,
    /// Dispatch buffer sizing.
    pub dispatch: DispatchConfig,
}

impl DistributorConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "distributor config loaded");
        Ok(config)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(ConfigError::Serialize)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.capacity == 0 || self.pool.capacity > MAX_POOL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "pool.capacity must be in 1..={MAX_POOL_CAPACITY}, got {}",
                self.pool.capacity
            )));
        }
        if self.dispatch.scratch_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.scratch_capacity must be non-zero".to_owned(),
            ));
        }
        Ok(())
    }
}
