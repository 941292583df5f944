//! Tuning knobs for the Gröbner completion.

use crate::error::{ResolutionError, Result};
use serde::{Deserialize, Serialize};

/// Number of products held in memory at once by the slice cache.
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

/// Configuration for resolution construction.
///
/// # Example
/// ```ignore
/// use pgroup_resolution::ResolutionConfig;
///
/// let config = ResolutionConfig::for_prime(3).with_block_size(256);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Products per block of a slice file
    pub block_size: usize,

    /// Unfruitful image rounds tolerated before the kernel gets a turn
    pub max_unfruitful: usize,

    /// Unfruitful rounds after which the kernel is completed unconditionally
    pub max_overshoot: usize,
}

impl ResolutionConfig {
    /// Default configuration for characteristic two
    pub fn new() -> Self {
        ResolutionConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            max_unfruitful: 2,
            max_overshoot: 1,
        }
    }

    /// Default configuration for characteristic `p`
    pub fn for_prime(p: u64) -> Self {
        if p % 2 == 1 {
            ResolutionConfig {
                block_size: DEFAULT_BLOCK_SIZE,
                max_unfruitful: 1,
                max_overshoot: 5,
            }
        } else {
            Self::new()
        }
    }

    /// Set the slice block size
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the stagnation threshold
    pub fn with_max_unfruitful(mut self, rounds: usize) -> Self {
        self.max_unfruitful = rounds;
        self
    }

    /// Set the overshoot threshold
    pub fn with_max_overshoot(mut self, rounds: usize) -> Self {
        self.max_overshoot = rounds;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ResolutionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the algorithm cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ResolutionError::BadArgument(
                "block size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_defaults() {
        let even = ResolutionConfig::for_prime(2);
        assert_eq!((even.max_unfruitful, even.max_overshoot), (2, 1));
        let odd = ResolutionConfig::for_prime(5);
        assert_eq!((odd.max_unfruitful, odd.max_overshoot), (1, 5));
        assert_eq!(odd.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn test_builder() {
        let config = ResolutionConfig::new()
            .with_block_size(7)
            .with_max_unfruitful(3)
            .with_max_overshoot(4);
        assert_eq!(config.block_size, 7);
        assert_eq!(config.max_unfruitful, 3);
        assert_eq!(config.max_overshoot, 4);
    }

    #[test]
    fn test_json_with_missing_fields() {
        let config = ResolutionConfig::from_json_str(r#"{ "block_size": 16 }"#).unwrap();
        assert_eq!(config.block_size, 16);
        assert_eq!(config.max_unfruitful, 2);
        assert!(ResolutionConfig::from_json_str(r#"{ "block_size": 0 }"#).is_err());
    }
}
