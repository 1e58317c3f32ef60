//! # Configuration Management
//!
//! Socket configuration for the query and RCON transports.
//!
//! The single behavioural knob of this layer is the I/O deadline applied to
//! connection establishment and data receipt. It is an explicit value passed
//! into socket construction, never a hidden process-wide default, so behavior
//! stays deterministic when many sockets are in flight.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-variable overrides via `from_env()`

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Maximum payload of a single query protocol datagram.
pub const MAX_DATAGRAM_SIZE: usize = 1400;

/// Per-socket configuration, passed by value into socket construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SocketConfig {
    /// Deadline for connection establishment and each data receipt.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,

    /// Receive size for a single query datagram.
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
}

fn default_max_packet_size() -> usize {
    MAX_DATAGRAM_SIZE
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            timeout: timeout::DEFAULT_TIMEOUT,
            max_packet_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl SocketConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::Config(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("GAMESERVER_PROTOCOL_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.timeout = Duration::from_millis(val);
            }
        }

        if let Ok(size) = std::env::var("GAMESERVER_PROTOCOL_MAX_PACKET_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.max_packet_size = val;
            }
        }

        Ok(config)
    }

    /// Override the I/O deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.timeout.as_millis() < 10 {
            errors.push("Timeout too short (minimum: 10ms)".to_string());
        } else if self.timeout.as_secs() > 300 {
            errors.push("Timeout too long (maximum: 300s)".to_string());
        }

        if self.max_packet_size < 64 {
            errors.push("Max packet size too small (minimum: 64 bytes)".to_string());
        } else if self.max_packet_size > MAX_DATAGRAM_SIZE {
            errors.push(format!(
                "Max packet size too large: {} bytes (protocol maximum: {} bytes)",
                self.max_packet_size, MAX_DATAGRAM_SIZE
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
