//! Server configuration
//!
//! Defaults match the reference behavior; each value can be overridden
//! from the environment. The bind address may also be passed as the
//! first command line argument.

use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::room::MAX_MEMBERS;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Grace delay before a closed room is deleted
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Grace delay before an emptied room is deleted
pub const DEFAULT_EMPTY_GRACE: Duration = Duration::from_secs(5);

/// Per-connection outbound queue length
pub const DEFAULT_OUTBOUND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub addr: String,
    /// Delay between close (or host disconnect) and deletion
    pub close_grace: Duration,
    /// Delay between the last member disconnecting and deletion
    pub empty_grace: Duration,
    /// Room capacity, host included
    pub max_members: usize,
    /// Per-connection outbound queue length
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            close_grace: DEFAULT_CLOSE_GRACE,
            empty_grace: DEFAULT_EMPTY_GRACE,
            max_members: MAX_MEMBERS,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Build from process arguments and environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env::args().nth(1), |key| env::var(key).ok())
    }

    /// Build from an optional CLI address and a variable lookup
    pub fn from_lookup(
        cli_addr: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(addr) = cli_addr.or_else(|| lookup("ROOM_RELAY_ADDR")) {
            if addr.trim().is_empty() {
                return Err(AppError::Config {
                    key: "ROOM_RELAY_ADDR",
                    reason: "address is empty".to_string(),
                });
            }
            config.addr = addr;
        }
        if let Some(ms) = parse_number(&lookup, "ROOM_RELAY_CLOSE_GRACE_MS")? {
            config.close_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number(&lookup, "ROOM_RELAY_EMPTY_GRACE_MS")? {
            config.empty_grace = Duration::from_millis(ms);
        }
        if let Some(n) = parse_number(&lookup, "ROOM_RELAY_MAX_MEMBERS")? {
            if n == 0 {
                return Err(AppError::Config {
                    key: "ROOM_RELAY_MAX_MEMBERS",
                    reason: "must be at least 1".to_string(),
                });
            }
            config.max_members = n as usize;
        }

        Ok(config)
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| AppError::Config {
            key,
            reason: format!("'{}': {}", raw, e),
        })
}
