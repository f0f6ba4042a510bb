//! # Node Configuration
//!
//! Runtime options read from the environment. Every field has a default so
//! an empty environment starts a working node.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `DN_SEND_TIMEOUT_MS` | `1000` | broker wait on a full subscriber channel |
//! | `DN_BUFFER_SIZE` | `10` | subscriber channel buffer (1..=10) |
//! | `DN_ACK` | `false` | ack mode for every subscriber |
//! | `DN_OBSERVE_RETRIES` | `200` | retry budget of observe streams, negative for unlimited |
//! | `DN_GENESIS_FILE` | unset | genesis document with `network_parameters` |
//! | `DN_CHECKPOINT_FILE` | unset | network parameters checkpoint, read at start, written at stop |
//! | `DN_SHUTDOWN_GRACE_MS` | `2000` | wait after cancelling subscribers |

use dn_subscribers::SubscriberConfig;
use shared_bus::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEND_TIMEOUT};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },

    #[error("buffer size {0} out of range")]
    BufferSize(usize),
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Broker wait on a full subscriber channel before dropping a batch.
    pub send_timeout: Duration,
    /// Subscriber channel buffer, in batches.
    pub buffer_size: usize,
    /// Run every subscriber in ack mode.
    pub ack: bool,
    /// Retry budget handed to observe streams.
    pub observe_retries: i64,
    pub genesis_file: Option<PathBuf>,
    pub checkpoint_file: Option<PathBuf>,
    /// Wait after cancellation so subscriber loops can drain.
    pub shutdown_grace: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            buffer_size: DEFAULT_CHANNEL_CAPACITY,
            ack: false,
            observe_retries: 200,
            genesis_file: None,
            checkpoint_file: None,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl NodeConfig {
    /// Defaults overridden by any `DN_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse_var::<u64>("DN_SEND_TIMEOUT_MS")? {
            config.send_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = parse_var("DN_BUFFER_SIZE")? {
            config.buffer_size = size;
        }
        if let Ok(value) = env::var("DN_ACK") {
            config.ack = parse_flag(&value);
        }
        if let Some(retries) = parse_var("DN_OBSERVE_RETRIES")? {
            config.observe_retries = retries;
        }
        config.genesis_file = env::var_os("DN_GENESIS_FILE").map(PathBuf::from);
        config.checkpoint_file = env::var_os("DN_CHECKPOINT_FILE").map(PathBuf::from);
        if let Some(ms) = parse_var::<u64>("DN_SHUTDOWN_GRACE_MS")? {
            config.shutdown_grace = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.subscriber_config()
            .validate()
            .map_err(|_| ConfigError::BufferSize(self.buffer_size))
    }

    /// Options shared by every subscriber.
    #[must_use]
    pub fn subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig {
            buffer_size: self.buffer_size,
            ack: self.ack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.subscriber_config(), SubscriberConfig::default());
        assert!(config.genesis_file.is_none());
    }

    #[test]
    fn test_buffer_size_range() {
        let config = NodeConfig {
            buffer_size: 0,
            ..NodeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BufferSize(0)));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
    }
}
