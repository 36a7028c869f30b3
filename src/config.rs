//! Runtime configuration
//!
//! Listen address comes from the first CLI argument, then the
//! `CHAT_RELAY_ADDR` environment variable, then the default.

use std::env;
use std::time::Duration;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Environment variable consulted when no address argument is given
pub const ADDR_ENV_VAR: &str = "CHAT_RELAY_ADDR";

/// Channel buffer size for server commands
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Time a new connection gets to complete the WebSocket upgrade
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the TCP listener binds to
    pub addr: String,
    /// Capacity of the handler → server command channel
    pub command_buffer: usize,
    /// Longest accepted display name, in characters (unlimited if None)
    pub max_name_len: Option<usize>,
    /// Connections still not upgraded after this long are dropped
    pub handshake_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            max_name_len: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl Config {
    /// Build configuration from process arguments and environment
    pub fn from_env() -> Self {
        Self::resolve(env::args().nth(1), env::var(ADDR_ENV_VAR).ok())
    }

    fn resolve(arg: Option<String>, env_addr: Option<String>) -> Self {
        let addr = arg
            .or(env_addr)
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        Self {
            addr,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.addr, "127.0.0.1:5000");
        assert_eq!(config.command_buffer, 256);
        assert_eq!(config.max_name_len, None);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_argument_wins_over_env() {
        let config = Config::resolve(
            Some("0.0.0.0:9000".to_string()),
            Some("127.0.0.1:7000".to_string()),
        );
        assert_eq!(config.addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_env_used_without_argument() {
        let config = Config::resolve(None, Some("127.0.0.1:7000".to_string()));
        assert_eq!(config.addr, "127.0.0.1:7000");

        let config = Config::resolve(None, None);
        assert_eq!(config.addr, DEFAULT_ADDR);
    }
}
