//! Client side filtering and ordering of coin lists.
//!
//! Everything here is pure: the input slice is never modified and the same input always
//! produces the same output, whatever its original order.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::coin::Coin;

const TOP_COUNT: usize = 10;
const PRICE_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr)]
pub enum SortOption {
    #[strum(serialize = "price_asc")]
    #[serde(rename = "price_asc")]
    PriceAscending,
    #[strum(serialize = "price_desc")]
    #[serde(rename = "price_desc")]
    PriceDescending,
    #[strum(serialize = "name_az")]
    #[serde(rename = "name_az")]
    NameAZ,
    #[strum(serialize = "name_za")]
    #[serde(rename = "name_za")]
    NameZA,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr)]
pub enum FilterOption {
    #[strum(serialize = "top10")]
    #[serde(rename = "top10")]
    Top10,
    #[strum(serialize = "price_above1")]
    #[serde(rename = "price_above1")]
    PriceAbove1,
}

pub fn filter(coins: &[Coin], option: FilterOption) -> Vec<Coin> {
    match option {
        FilterOption::Top10 => coins.iter().take(TOP_COUNT).cloned().collect(),
        FilterOption::PriceAbove1 => coins.iter().filter(|coin| coin.price > PRICE_FLOOR).cloned().collect(),
    }
}

/// Orders coins by `option`; equal keys fall back to the coin id.
pub fn sort(coins: &[Coin], option: SortOption) -> Vec<Coin> {
    let mut sorted = coins.to_vec();

    match option {
        SortOption::PriceAscending => {
            sorted.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        },
        SortOption::PriceDescending => {
            sorted.sort_by(|a, b| b.price.total_cmp(&a.price).then_with(|| a.id.cmp(&b.id)));
        },
        SortOption::NameAZ => {
            sorted.sort_by_cached_key(|coin| (coin.name.to_lowercase(), coin.id.clone()));
        },
        SortOption::NameZA => {
            sorted.sort_by_cached_key(|coin| (Reverse(coin.name.to_lowercase()), coin.id.clone()));
        },
    }

    sorted
}

/// Filter first, then sort.
pub fn arrange(coins: &[Coin], filter_option: Option<FilterOption>, sort_option: Option<SortOption>) -> Vec<Coin> {
    let filtered = match filter_option {
        Some(option) => filter(coins, option),
        None => coins.to_vec(),
    };

    match sort_option {
        Some(option) => sort(&filtered, option),
        None => filtered,
    }
}
