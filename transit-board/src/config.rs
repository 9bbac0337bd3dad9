//! Configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::feed::FeedConfig;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;

pub const API_KEY_VAR: &str = "TRANSIT_API_KEY";
/// Older name for the API key, still accepted.
pub const API_KEY_ALIAS_VAR: &str = "MTA_API_KEY";
pub const REFRESH_SECS_VAR: &str = "TRANSIT_REFRESH_SECS";
pub const FEED_URLS_VAR: &str = "TRANSIT_FEED_URLS";
pub const STATIC_DIR_VAR: &str = "TRANSIT_STATIC_DIR";
pub const BIND_ADDR_VAR: &str = "TRANSIT_BIND_ADDR";
pub const FEED_TIMEOUT_SECS_VAR: &str = "TRANSIT_FEED_TIMEOUT_SECS";
pub const MAX_CONCURRENT_FEEDS_VAR: &str = "TRANSIT_MAX_CONCURRENT_FEEDS";
pub const MOCK_FEED_DIR_VAR: &str = "TRANSIT_MOCK_FEED_DIR";

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Errors reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Where real-time feeds come from.
#[derive(Debug, Clone)]
pub enum FeedSettings {
    /// Fetch over HTTP
    Live(FeedConfig),
    /// Serve `.pb` files from a directory instead
    Mock(PathBuf),
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `stops.txt` and `routes.txt`
    pub static_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub refresh_interval: Duration,
    pub feeds: FeedSettings,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let refresh_interval = match parse_var::<u64>(REFRESH_SECS_VAR, var(REFRESH_SECS_VAR))? {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REFRESH_INTERVAL,
        };

        let bind_addr = parse_var(BIND_ADDR_VAR, var(BIND_ADDR_VAR))?.unwrap_or(DEFAULT_BIND_ADDR);

        let static_dir = var(STATIC_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_static_dir);

        let feeds = match var(MOCK_FEED_DIR_VAR) {
            Some(dir) => FeedSettings::Mock(PathBuf::from(dir)),
            None => {
                let api_key = var(API_KEY_VAR)
                    .or_else(|| var(API_KEY_ALIAS_VAR))
                    .ok_or(ConfigError::Missing(API_KEY_VAR))?;

                let mut feed = FeedConfig::new(api_key);
                if let Some(raw) = var(FEED_URLS_VAR) {
                    let urls: Vec<_> = raw
                        .split(',')
                        .map(str::trim)
                        .filter(|url| !url.is_empty())
                        .collect();
                    if urls.is_empty() {
                        return Err(ConfigError::Invalid {
                            name: FEED_URLS_VAR,
                            value: raw,
                        });
                    }
                    feed = feed.with_endpoints(urls);
                }
                if let Some(secs) =
                    parse_var::<u64>(FEED_TIMEOUT_SECS_VAR, var(FEED_TIMEOUT_SECS_VAR))?
                {
                    feed = feed.with_timeout(Duration::from_secs(secs));
                }
                if let Some(n) =
                    parse_var::<usize>(MAX_CONCURRENT_FEEDS_VAR, var(MAX_CONCURRENT_FEEDS_VAR))?
                {
                    if n == 0 {
                        return Err(ConfigError::Invalid {
                            name: MAX_CONCURRENT_FEEDS_VAR,
                            value: n.to_string(),
                        });
                    }
                    feed = feed.with_max_concurrent(n);
                }
                FeedSettings::Live(feed)
            }
        };

        Ok(Self {
            static_dir,
            bind_addr,
            refresh_interval,
            feeds,
        })
    }
}

/// Default location of the unpacked static schedule.
pub fn default_static_dir() -> PathBuf {
    std::env::temp_dir().join("transit_cache_dir").join("nyct")
}

fn parse_var<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
