//! Registry options
//!
//! Options are plain data with defaults; they can be built in code with the
//! `with_*` setters or read from a TOML table:
//!
//! ```toml
//! shard_count = 128
//! initial_capacity = 1024
//! max_frame_len = 1048576
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in registry options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Failed to parse TOML
    #[error("Failed to parse registry options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Shard count must be a power of two greater than one
    #[error("Invalid shard count {0}: must be a power of two greater than one")]
    InvalidShardCount(usize),

    /// Frame limit too small to hold a prefix and a discriminant
    #[error("Invalid frame limit {0}: must be at least 8 bytes")]
    InvalidFrameLimit(usize),
}

/// Tuning for a [`ComponentRegistry`](crate::ComponentRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Lock shards per category table
    pub shard_count: usize,

    /// Pre-allocated slots per category table
    pub initial_capacity: usize,

    /// Largest framed buffer (prefix included) accepted or produced
    pub max_frame_len: usize,
}

/// Default number of shards per category table
pub const DEFAULT_SHARD_COUNT: usize = 64;

/// Default frame limit (64 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            initial_capacity: 0,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl RegistryOptions {
    /// Set the shard count
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Set the initial capacity
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Set the frame limit
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Parse options from TOML; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let options: RegistryOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.shard_count < 2 || !self.shard_count.is_power_of_two() {
            return Err(OptionsError::InvalidShardCount(self.shard_count));
        }
        if self.max_frame_len < 8 {
            return Err(OptionsError::InvalidFrameLimit(self.max_frame_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RegistryOptions::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options = RegistryOptions::from_toml_str("shard_count = 256\n").unwrap();
        assert_eq!(options.shard_count, 256);
        assert_eq!(options.max_frame_len, DEFAULT_MAX_FRAME_LEN);
    }

    #[test]
    fn test_rejects_bad_shard_count() {
        assert!(matches!(
            RegistryOptions::default().with_shard_count(12).validate(),
            Err(OptionsError::InvalidShardCount(12))
        ));
        assert!(matches!(
            RegistryOptions::from_toml_str("shard_count = 1"),
            Err(OptionsError::InvalidShardCount(1))
        ));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(matches!(
            RegistryOptions::from_toml_str("shard_count = \"many\""),
            Err(OptionsError::ParseError(_))
        ));
    }
}
