use std::sync::Arc;

use crate::coin::Coin;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_percentage_24h: f64,
}

/// Delivers price alerts; how they reach the user is up to the implementation.
pub trait PriceNotifier: Send + Sync {
    fn notify(&self, alert: &PriceAlert);
}

/// Writes alerts to the log.
pub struct LogNotifier;

impl PriceNotifier for LogNotifier {
    fn notify(&self, alert: &PriceAlert) {
        tracing::info!(
            coin = %alert.coin_id,
            price = alert.price,
            change = alert.change_percentage_24h,
            "{} ({}) moved {:+.2}% in 24h",
            alert.name,
            alert.symbol.to_uppercase(),
            alert.change_percentage_24h,
        );
    }
}

pub struct PriceAlerts {
    threshold_percent: f64,
    notifier: Arc<dyn PriceNotifier>,
}

impl PriceAlerts {
    pub fn new(threshold_percent: f64, notifier: Arc<dyn PriceNotifier>) -> Self {
        Self {
            threshold_percent: threshold_percent.abs(),
            notifier,
        }
    }

    /// Raises an alert when the market leader moved at least the threshold in 24h.
    pub fn check(&self, coins: &[Coin]) -> Option<PriceAlert> {
        let leader = coins.first()?;
        let change = leader.price_change_percentage_24h.unwrap_or_default();

        if change.abs() < self.threshold_percent {
            return None;
        }

        let alert = PriceAlert {
            coin_id: leader.id.clone(),
            name: leader.name.clone(),
            symbol: leader.symbol.clone(),
            price: leader.price,
            change_percentage_24h: change,
        };
        self.notifier.notify(&alert);

        Some(alert)
    }
}
