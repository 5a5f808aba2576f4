pub mod alerts;
pub mod arrange;
pub mod cache;
pub mod coin;
pub mod error;
pub mod favorites;
pub mod fetcher;
pub mod kv_store;
pub mod pagination;
pub mod persist;
pub mod retry;
pub mod sync;

#[cfg(feature = "coingecko")]
pub mod coingecko;
#[cfg(feature = "settings")]
pub mod settings;
#[cfg(feature = "telemetry")]
pub mod telemetry;

#[cfg(feature = "coingecko")]
pub extern crate coingecko_client;
#[cfg(feature = "settings")]
pub extern crate config;

pub use coin::Coin;
pub use error::{SyncError, SyncResult};
pub use sync::{CoinListSync, SyncDeps, SyncHandle, SyncMode, SyncOptions};
