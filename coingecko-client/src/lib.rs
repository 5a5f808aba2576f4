use anyhow::Context;
use http::{HeaderMap, HeaderName, StatusCode};
use http_client::settings::HttpClientSettings;
use types::{MarketCoin, SearchCoin, SearchResponse, SimplePrices};

pub mod types;

pub const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

const VS_CURRENCY: &str = "usd";

pub struct CoingeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoingeckoClient {
    pub fn new(settings: HttpClientSettings) -> anyhow::Result<Self> {
        let mut builder = settings.client_builder();

        let HttpClientSettings { api_key, base_url, .. } = settings;

        let base_url = match (base_url, &api_key) {
            (Some(base_url), _) => base_url,
            (None, Some(_)) => PRO_BASE_URL.to_string(),
            (None, None) => PUBLIC_BASE_URL.to_string(),
        };

        if let Some(api_key) = api_key {
            builder = builder.default_headers(HeaderMap::from_iter([(
                HeaderName::from_static("x-cg-pro-api-key"),
                api_key.try_into()?,
            )]));
        };

        let client = builder.build().context("Unable to build coingecko client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of `/coins/markets` ordered by market cap.
    ///
    /// The free API answers a rate limited request with a status object instead of a list,
    /// sometimes with a 200. Both shapes are reported as an empty page.
    pub async fn coins_markets(&self, page: u32, per_page: u32) -> anyhow::Result<Vec<MarketCoin>> {
        let response = self
            .client
            .get(format!("{base_url}/coins/markets", base_url = self.base_url))
            .query(&[
                ("vs_currency", VS_CURRENCY.to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(page, "coingecko rate limit reached");
            return Ok(Vec::new());
        }

        let body = response.error_for_status()?.json::<serde_json::Value>().await?;

        if !body.is_array() {
            tracing::warn!(page, %body, "coingecko answered with a non list body");
            return Ok(Vec::new());
        }

        serde_json::from_value(body).context("Unable to parse coins markets")
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchCoin>> {
        let response = self
            .client
            .get(format!("{base_url}/search", base_url = self.base_url))
            .query(&[("query", query)])
            .send()
            .await?;

        let response = response.error_for_status()?;

        Ok(response.json::<SearchResponse>().await?.coins)
    }

    pub async fn simple_prices(&self, ids: &[String]) -> anyhow::Result<SimplePrices> {
        if ids.is_empty() {
            return Ok(SimplePrices::new());
        }

        let response = self
            .client
            .get(format!("{base_url}/simple/price", base_url = self.base_url))
            .query(&[("ids", ids.join(",")), ("vs_currencies", VS_CURRENCY.to_string())])
            .send()
            .await?;

        let response = response.error_for_status()?;

        Ok(response.json::<SimplePrices>().await?)
    }
}
