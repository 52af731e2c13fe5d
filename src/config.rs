use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Per-subscriber delivery limits
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Frames that may queue for one subscriber before it counts as stalled
    pub outbound_buffer: usize,
    /// Upper bound on a single socket write
    pub write_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            outbound_buffer: 64,
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration for the server process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub connection: ConnectionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            connection: ConnectionSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("AMA_BIND_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "AMA_BIND_ADDR",
                    value: raw.clone(),
                })?,
            None => defaults.bind_addr,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let outbound_buffer = match lookup("AMA_OUTBOUND_BUFFER") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "AMA_OUTBOUND_BUFFER",
                        value: raw,
                    })
                }
            },
            None => defaults.connection.outbound_buffer,
        };

        let write_timeout = match lookup("AMA_WRITE_TIMEOUT_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "AMA_WRITE_TIMEOUT_MS",
                        value: raw,
                    })
                }
            },
            None => defaults.connection.write_timeout,
        };

        Ok(Self {
            bind_addr,
            database_url,
            connection: ConnectionSettings {
                outbound_buffer,
                write_timeout,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, ServerConfig::default().bind_addr);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(config.database_url.is_none());
        assert_eq!(config.connection.outbound_buffer, 64);
        assert_eq!(config.connection.write_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("AMA_BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/ama"),
            ("AMA_OUTBOUND_BUFFER", "8"),
            ("AMA_WRITE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/ama")
        );
        assert_eq!(config.connection.outbound_buffer, 8);
        assert_eq!(config.connection.write_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = ServerConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("AMA_BIND_ADDR", "nowhere")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue {
                key: "AMA_BIND_ADDR",
                ..
            })
        ));

        let err = ServerConfig::from_lookup(lookup_from(&[("AMA_OUTBOUND_BUFFER", "0")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue {
                key: "AMA_OUTBOUND_BUFFER",
                ..
            })
        ));

        let err = ServerConfig::from_lookup(lookup_from(&[("AMA_WRITE_TIMEOUT_MS", "soon")]));
        assert!(err.is_err());
    }
}
