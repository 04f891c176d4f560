//! Environment-driven configuration.
//!
//! The process takes no CLI flags; everything operational comes from the
//! environment. Both variables have dev-friendly defaults:
//!
//! | Variable     | Default   |
//! |--------------|-----------|
//! | `TASKD_HOST` | `0.0.0.0` |
//! | `TASKD_PORT` | `3000`    |

use std::env;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TASKD_PORT is not a valid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("TASKD_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port = match env::var("TASKD_PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => 3000,
        };
        Ok(Self { host, port })
    }

    /// The `host:port` string [`Server::bind`](crate::Server::bind) expects.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
