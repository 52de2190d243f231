use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::enqueue::FailurePolicy;

pub const DEFAULT_NZBGEEK_API_URL: &str = "https://api.nzbgeek.info/api";
pub const DEFAULT_SABCMD_PATH: &str = "./sabcmd/sabcmd";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process-wide settings, loaded once at startup and handed to the
/// components that need them.
#[derive(Clone)]
pub struct Config {
    pub nzbgeek_api_key: String,
    pub nzbgeek_api_url: String,
    pub nzbgeek_timeout: Duration,
    pub sabcmd_path: PathBuf,
    pub sabcmd_timeout: Duration,
    pub sabcmd_max_concurrent: usize,
    pub failure_policy: FailurePolicy,
    pub bind_addr: SocketAddr,
    pub static_dir: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("nzbgeek_api_key", &"***")
            .field("nzbgeek_api_url", &self.nzbgeek_api_url)
            .field("nzbgeek_timeout", &self.nzbgeek_timeout)
            .field("sabcmd_path", &self.sabcmd_path)
            .field("sabcmd_timeout", &self.sabcmd_timeout)
            .field("sabcmd_max_concurrent", &self.sabcmd_max_concurrent)
            .field("failure_policy", &self.failure_policy)
            .field("bind_addr", &self.bind_addr)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first
    /// if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is this with
    /// `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nzbgeek_api_key = get_env(&lookup, "NZBGEEK_API_KEY")?;
        let nzbgeek_api_url = get_env_or_default(&lookup, "NZBGEEK_API_URL", DEFAULT_NZBGEEK_API_URL);
        let nzbgeek_timeout = Duration::from_secs(parse_env(&lookup, "NZBGEEK_TIMEOUT_SECS", 30u64)?);

        let sabcmd_path = PathBuf::from(get_env_or_default(&lookup, "SABCMD_PATH", DEFAULT_SABCMD_PATH));
        let sabcmd_timeout = Duration::from_secs(parse_env(&lookup, "SABCMD_TIMEOUT_SECS", 60u64)?);
        let sabcmd_max_concurrent = parse_env(&lookup, "SABCMD_MAX_CONCURRENT", 4usize)?;
        if sabcmd_max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                key: "SABCMD_MAX_CONCURRENT",
                value: lookup("SABCMD_MAX_CONCURRENT").unwrap_or_default(),
                reason: "must be at least 1".to_string(),
            });
        }
        let failure_policy = parse_env(&lookup, "SABCMD_FAILURE_POLICY", FailurePolicy::Strict)?;

        let bind_addr = parse_env(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;
        let static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            nzbgeek_api_key,
            nzbgeek_api_url,
            nzbgeek_timeout,
            sabcmd_path,
            sabcmd_timeout,
            sabcmd_max_concurrent,
            failure_policy,
            bind_addr,
            static_dir,
        })
    }
}

fn get_env<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn get_env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
        None => Ok(default),
    }
}
