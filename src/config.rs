//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                 | Default     |
//! |--------------------------|-------------|
//! | `RELAY_HOST`             | `127.0.0.1` |
//! | `RELAY_PORT`             | `8080`      |
//! | `RELAY_MAX_CLIENTS`      | `10`        |
//! | `RELAY_READ_BUFFER_SIZE` | `1024`      |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::RelayError;

/// Default listen host.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default pending-connection backlog.
pub const DEFAULT_MAX_CLIENTS: u32 = 10;

/// Bytes read from a socket per frame.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Socket address to bind the listener to.
    pub listen_addr: SocketAddr,

    /// Listen backlog. A hint to the kernel's pending-connection queue, not
    /// a limit on concurrent sessions.
    pub max_clients: u32,

    /// Size of the per-read buffer; one read is one frame.
    pub read_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
            max_clients: DEFAULT_MAX_CLIENTS,
            read_buffer_size: READ_BUFFER_SIZE,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `RELAY_HOST` is not an IP
    /// address, `RELAY_PORT` is not a port number, or the read buffer size
    /// is zero.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match non_blank(lookup("RELAY_HOST")) {
            Some(raw) => raw.parse::<IpAddr>().map_err(|err| {
                RelayError::InvalidConfig(format!("RELAY_HOST={raw:?}: {err}"))
            })?,
            None => DEFAULT_HOST,
        };

        let port = match non_blank(lookup("RELAY_PORT")) {
            Some(raw) => raw.parse::<u16>().map_err(|err| {
                RelayError::InvalidConfig(format!("RELAY_PORT={raw:?}: {err}"))
            })?,
            None => DEFAULT_PORT,
        };

        let max_clients = parse_or(lookup("RELAY_MAX_CLIENTS"), DEFAULT_MAX_CLIENTS);
        let read_buffer_size = parse_or(lookup("RELAY_READ_BUFFER_SIZE"), READ_BUFFER_SIZE);
        if read_buffer_size == 0 {
            return Err(RelayError::InvalidConfig(
                "RELAY_READ_BUFFER_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            max_clients,
            read_buffer_size,
        })
    }
}

/// Treats unset and whitespace-only values alike.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `value` as `T`, returning `default` on missing or invalid values.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    non_blank(value)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, RelayError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let Ok(config) = load(&[]) else {
            panic!("empty environment should load");
        };
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_clients, 10);
        assert_eq!(config.read_buffer_size, 1024);
    }

    #[test]
    fn blank_values_use_defaults() {
        let Ok(config) = load(&[("RELAY_HOST", "  "), ("RELAY_PORT", "")]) else {
            panic!("blank values should load");
        };
        assert_eq!(config.listen_addr, SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT));
    }

    #[test]
    fn reads_overrides() {
        let Ok(config) = load(&[
            ("RELAY_HOST", "0.0.0.0"),
            ("RELAY_PORT", "9000"),
            ("RELAY_MAX_CLIENTS", "64"),
            ("RELAY_READ_BUFFER_SIZE", "4096"),
        ]) else {
            panic!("overrides should load");
        };
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(config.max_clients, 64);
        assert_eq!(config.read_buffer_size, 4096);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(matches!(
            load(&[("RELAY_PORT", "99999")]),
            Err(RelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_host_is_rejected() {
        assert!(matches!(
            load(&[("RELAY_HOST", "not-an-ip")]),
            Err(RelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unparseable_max_clients_falls_back() {
        let Ok(config) = load(&[("RELAY_MAX_CLIENTS", "lots")]) else {
            panic!("bad max clients should fall back");
        };
        assert_eq!(config.max_clients, DEFAULT_MAX_CLIENTS);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        assert!(matches!(
            load(&[("RELAY_READ_BUFFER_SIZE", "0")]),
            Err(RelayError::InvalidConfig(_))
        ));
    }
}
