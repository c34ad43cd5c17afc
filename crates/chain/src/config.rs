//! Chain configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ChainError;

/// Immutable settings shared by the builder and the walker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainConfig {
    /// Hex characters of payload carried by each record code.
    #[serde(default = "default_tag_size")]
    pub tag_size: usize,

    /// Random bytes per nonce (hex-encoded, so twice as many characters).
    #[serde(default = "default_nonce_size")]
    pub nonce_size: usize,

    /// Pause before every request, in milliseconds.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// Attempts per request before giving up.
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    /// Multiplier applied to the pause for each retry.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound on the retry delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_tag_size() -> usize {
    128
}

fn default_nonce_size() -> usize {
    2
}

fn default_pause_ms() -> u64 {
    500
}

fn default_max_tries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            tag_size: default_tag_size(),
            nonce_size: default_nonce_size(),
            pause_ms: default_pause_ms(),
            max_tries: default_max_tries(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ChainConfig {
    /// Checks that the settings can produce a decodable chain.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.tag_size == 0 || self.tag_size % 2 != 0 {
            return Err(ChainError::Config(format!(
                "tag_size must be a positive even number, got {}",
                self.tag_size
            )));
        }
        if self.nonce_size == 0 {
            return Err(ChainError::Config("nonce_size must be at least 1".into()));
        }
        if self.max_tries == 0 {
            return Err(ChainError::Config("max_tries must be at least 1".into()));
        }
        if self.backoff_factor.is_nan() || self.backoff_factor < 1.0 {
            return Err(ChainError::Config(format!(
                "backoff_factor must be >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Pause before each request.
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Retry delay cap.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
