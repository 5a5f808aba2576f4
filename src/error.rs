use std::io;

use strum::IntoStaticStr;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error, IntoStaticStr)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "settings")]
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Coin list sync is no longer running")]
    Closed,
}

impl SyncError {
    /// Stable name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
