use async_trait::async_trait;

use crate::coin::Coin;

/// Remote source of market pages and search results.
#[async_trait]
pub trait CoinFetcher: Send + Sync {
    /// One page of coins ordered by market cap, `page` starts at 1.
    async fn fetch_page(&self, page: u32, per_page: u32) -> anyhow::Result<Vec<Coin>>;

    async fn search(&self, query: &str) -> anyhow::Result<Vec<Coin>>;
}

/// Asks the user whether a failed page fetch should be tried again.
#[async_trait]
pub trait RetryPrompt: Send + Sync {
    async fn confirm_retry(&self) -> bool;
}

/// Never retries, for headless use.
pub struct DeclineRetry;

#[async_trait]
impl RetryPrompt for DeclineRetry {
    async fn confirm_retry(&self) -> bool {
        false
    }
}
