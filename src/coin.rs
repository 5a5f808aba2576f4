use serde::{Deserialize, Serialize};

/// Market record of a single coin.
///
/// `id` is the only identity used for merging and deduplication. `is_favorite` is an overlay
/// computed from the favorites store and is never trusted when read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulating_supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_supply: Option<f64>,
}

impl Coin {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            price,
            image: String::new(),
            is_favorite: false,
            market_cap: None,
            market_cap_rank: None,
            total_volume: None,
            price_change_24h: None,
            price_change_percentage_24h: None,
            high_24h: None,
            low_24h: None,
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_price_change_percentage_24h(mut self, change: f64) -> Self {
        self.price_change_percentage_24h = Some(change);
        self
    }
}
