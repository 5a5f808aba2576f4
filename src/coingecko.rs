use async_trait::async_trait;
use coingecko_client::{
    types::{MarketCoin, SearchCoin},
    CoingeckoClient,
};

use crate::{coin::Coin, fetcher::CoinFetcher};

impl From<MarketCoin> for Coin {
    fn from(market: MarketCoin) -> Self {
        Self {
            id: market.id,
            name: market.name,
            symbol: market.symbol,
            price: market.current_price.unwrap_or_default(),
            image: market.image,
            is_favorite: false,
            market_cap: market.market_cap,
            market_cap_rank: market.market_cap_rank,
            total_volume: market.total_volume,
            price_change_24h: market.price_change_24h,
            price_change_percentage_24h: market.price_change_percentage_24h,
            high_24h: market.high_24h,
            low_24h: market.low_24h,
            circulating_supply: market.circulating_supply,
            total_supply: market.total_supply,
            max_supply: market.max_supply,
        }
    }
}

impl From<SearchCoin> for Coin {
    fn from(hit: SearchCoin) -> Self {
        let mut coin = Coin::new(hit.id, hit.name, hit.symbol, 0.0).with_image(hit.large);
        coin.market_cap_rank = hit.market_cap_rank;
        coin
    }
}

#[async_trait]
impl CoinFetcher for CoingeckoClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_page(&self, page: u32, per_page: u32) -> anyhow::Result<Vec<Coin>> {
        let markets = self.coins_markets(page, per_page).await?;

        Ok(markets.into_iter().map(Coin::from).collect())
    }

    /// Search hits carry no price, so they are priced with one extra request. Without prices the
    /// hits are still returned.
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> anyhow::Result<Vec<Coin>> {
        let mut coins: Vec<Coin> = self.search(query).await?.into_iter().map(Coin::from).collect();

        let ids: Vec<String> = coins.iter().map(|coin| coin.id.clone()).collect();
        match self.simple_prices(&ids).await {
            Ok(prices) => {
                for coin in &mut coins {
                    if let Some(usd) = prices.get(&coin.id).and_then(|price| price.usd) {
                        coin.price = usd;
                    }
                }
            },
            Err(err) => tracing::warn!(?err, "unable to price search results"),
        }

        Ok(coins)
    }
}
