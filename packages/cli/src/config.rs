// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Covers bind address, database tuning, store timeout, membership lists, and vote rate limits

use bookclub_config::constants;
use bookclub_storage::StorageConfig;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Per-voter vote throttle
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub votes_per_minute: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            votes_per_minute: 30,
            burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// Seconds until a throttled voter regains one vote
    pub fn retry_after_secs(&self) -> u64 {
        let per_minute = u64::from(self.votes_per_minute.max(1));
        60_u64.div_ceil(per_minute).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
    pub store_timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub approved_members: Vec<String>,
    pub admins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var(constants::BOOKCLUB_API_PORT)
            .unwrap_or_else(|_| "4100".to_string())
            .parse::<u16>()?;

        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host_str =
            env::var(constants::BOOKCLUB_API_HOST).unwrap_or_else(|_| "127.0.0.1".to_string());
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let database_path = env::var(constants::BOOKCLUB_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| bookclub_core::database_file());

        let max_connections = parse_number(constants::BOOKCLUB_MAX_CONNECTIONS, 10u32)?;
        let busy_timeout_seconds = parse_number(constants::BOOKCLUB_BUSY_TIMEOUT_SECS, 5u64)?;
        let store_timeout_secs = parse_number(constants::BOOKCLUB_STORE_TIMEOUT_SECS, 10u64)?;

        let rate_limit = RateLimitConfig {
            enabled: env::var(constants::RATE_LIMIT_ENABLED)
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            votes_per_minute: parse_number(constants::RATE_LIMIT_VOTES_PER_MINUTE, 30u32)?,
            burst_size: parse_number(constants::RATE_LIMIT_BURST_SIZE, 5u32)?,
        };

        Ok(Config {
            host,
            port,
            database_path,
            max_connections,
            busy_timeout_seconds,
            store_timeout: Duration::from_secs(store_timeout_secs),
            rate_limit,
            approved_members: parse_list(constants::BOOKCLUB_APPROVED_MEMBERS),
            admins: parse_list(constants::BOOKCLUB_ADMINS),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            path: self.database_path.clone(),
            enable_wal: true,
            max_connections: self.max_connections,
            busy_timeout_seconds: self.busy_timeout_seconds,
        }
    }
}

/// Unset means `default`; set but unparsable (or zero) is an error
fn parse_number<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value != T::default() => Ok(value),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

fn parse_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
