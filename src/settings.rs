use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError};
use http_client::settings::HttpClientSettings;
use serde::{de::DeserializeOwned, Deserialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};

use crate::{
    cache::DEFAULT_TTL,
    error::SyncResult,
    favorites::DEFAULT_FAVORITES_KEY,
    pagination::DEFAULT_PER_PAGE,
    retry::RetryPolicy,
    sync::{SyncOptions, DEFAULT_SEARCH_DEBOUNCE},
};
#[cfg(feature = "telemetry")]
use crate::telemetry::TracingSettings;

pub static DEFAULT_SETTINGS_FILE: &str = "settings.toml";
/// Environment overrides look like `COIN_SYNC__PAGINATION__PER_PAGE=50`.
pub static ENV_PREFIX: &str = "COIN_SYNC";

const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub cache: CacheSettings,
    pub favorites: FavoritesSettings,
    pub pagination: PaginationSettings,
    pub search: SearchSettings,
    pub retry: RetrySettings,
    pub alerts: AlertSettings,
    pub coingecko: HttpClientSettings,
    #[cfg(feature = "telemetry")]
    pub tracing: TracingSettings,
}

impl SyncSettings {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            per_page: self.pagination.per_page,
            search_debounce: self.search.debounce,
            retry: RetryPolicy::from(&self.retry),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub path: PathBuf,
    #[serde(rename = "ttl_sec")]
    #[serde_as(as = "DurationSeconds")]
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("coins_cache.json"),
            ttl: DEFAULT_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FavoritesSettings {
    /// JSON document holding the favorites key.
    pub path: PathBuf,
    pub key: String,
}

impl Default for FavoritesSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("user_settings.json"),
            key: DEFAULT_FAVORITES_KEY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub per_page: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    #[serde(rename = "debounce_ms")]
    #[serde_as(as = "DurationMilliSeconds")]
    pub debounce: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    /// Enables a growing pause between confirmed retries.
    #[serde(rename = "backoff_initial_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds>")]
    pub backoff_initial: Option<Duration>,
    #[serde(rename = "backoff_max_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds>")]
    pub backoff_max: Option<Duration>,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        let policy = RetryPolicy {
            max_attempts: settings.max_attempts,
            backoff: None,
        };

        match settings.backoff_initial {
            Some(initial) => {
                let max = settings.backoff_max.unwrap_or(DEFAULT_BACKOFF_MAX).max(initial);
                policy.with_backoff(initial, max)
            },
            None => policy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Absolute 24h change of the market leader that raises an alert. Alerts are off when unset.
    pub threshold_percent: Option<f64>,
}

/// Reads `file` (toml, optional) and overlays `{env_prefix}__SECTION__KEY` variables.
pub fn try_read_file_config<T, E>(file: &str, env_prefix: &str) -> Result<T, E>
where
    T: DeserializeOwned,
    E: From<ConfigError>,
{
    let sources = Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
        .build()?;

    Ok(sources.try_deserialize()?)
}

/// Like [`try_read_file_config`], but an unreadable configuration only costs a warning.
pub fn read_file_config_or_default<T>(file: &str, env_prefix: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match try_read_file_config::<T, ConfigError>(file, env_prefix) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(file, %error, "settings unreadable, using built-in defaults");
            T::default()
        },
    }
}

pub fn try_read_settings(file: &str) -> SyncResult<SyncSettings> {
    try_read_file_config(file, ENV_PREFIX)
}

pub fn read_settings_or_default(file: &str) -> SyncSettings {
    read_file_config_or_default(file, ENV_PREFIX)
}
