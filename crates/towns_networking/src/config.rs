//! # Client Configuration
//!
//! Loaded once at startup from a TOML file. Every key is optional; missing
//! keys take the defaults below.
//!
//! ```toml
//! connect_timeout_ms = 5000
//! max_packets_per_process = 1
//!
//! [account]
//! host = "localhost"
//! port = 9601
//!
//! [transport]
//! resend_timeout_ms = 200
//! max_resends = 10
//! connect_attempts = 5
//! recv_buffer_size = 1200
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default account server host.
pub const DEFAULT_ACCOUNT_HOST: &str = "localhost";

/// Default account server port.
pub const DEFAULT_ACCOUNT_PORT: u16 = 9601;

/// Window within which a connect attempt must succeed.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Largest datagram the transport sends or accepts.
pub const MAX_DATAGRAM_SIZE: usize = 1200;

/// Account server address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountServerConfig {
    /// Host name or address.
    pub host: String,
    /// UDP port.
    pub port: u16,
}

impl Default for AccountServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ACCOUNT_HOST.to_string(),
            port: DEFAULT_ACCOUNT_PORT,
        }
    }
}

/// Reliable-UDP tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Time before an unacknowledged frame is resent.
    pub resend_timeout_ms: u64,
    /// Resends of one data frame before the peer is declared lost.
    pub max_resends: u32,
    /// Connect frames sent before a connect attempt gives up.
    pub connect_attempts: u32,
    /// Receive buffer size in bytes; at least [`MAX_DATAGRAM_SIZE`].
    pub recv_buffer_size: usize,
}

impl TransportConfig {
    /// Resend timeout as a [`Duration`].
    #[must_use]
    pub const fn resend_timeout(&self) -> Duration {
        Duration::from_millis(self.resend_timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            resend_timeout_ms: 200,
            max_resends: 10,
            connect_attempts: 5,
            recv_buffer_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Account server to connect to.
    pub account: AccountServerConfig,
    /// Connect timeout enforced by the connection flow.
    pub connect_timeout_ms: u64,
    /// Packets dispatched per `process()` call.
    pub max_packets_per_process: usize,
    /// Transport tuning.
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account: AccountServerConfig::default(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_packets_per_process: 1,
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_packets_per_process == 0 {
            return Err(ConfigError::Invalid(
                "max_packets_per_process must be at least 1".into(),
            ));
        }
        if self.transport.connect_attempts == 0 {
            return Err(ConfigError::Invalid(
                "transport.connect_attempts must be at least 1".into(),
            ));
        }
        if self.transport.recv_buffer_size < MAX_DATAGRAM_SIZE {
            return Err(ConfigError::Invalid(format!(
                "transport.recv_buffer_size must be at least {MAX_DATAGRAM_SIZE}"
            )));
        }
        Ok(())
    }
}
