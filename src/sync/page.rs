use tokio::sync::mpsc;

use super::{Event, SyncDeps};
use crate::{coin::Coin, retry::RetryPolicy};

#[derive(Debug, Clone, Copy)]
pub(super) struct PageRequest {
    pub generation: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug)]
pub(super) struct PageOutcome {
    pub coins: Vec<Coin>,
    /// `false` when the coins come from the disk cache.
    pub from_network: bool,
}

/// Fetches one page, asking the user before each retry, and reports the outcome to the actor.
///
/// A page that could not be fetched or came back empty is replaced by the cached coins.
#[tracing::instrument(skip_all, fields(page = request.page, generation = request.generation))]
pub(super) async fn fetch_page(
    request: PageRequest,
    deps: SyncDeps,
    retry: RetryPolicy,
    events: mpsc::UnboundedSender<Event>,
) {
    let PageRequest {
        generation,
        page,
        per_page,
    } = request;
    let mut attempts = retry.start();

    let fetched = loop {
        match deps.fetcher.fetch_page(page, per_page).await {
            Ok(coins) => break Some(coins),
            Err(err) => {
                let _ = events.send(Event::Loading {
                    generation,
                    is_loading: false,
                });

                let retry_allowed = attempts.record_failure();
                tracing::warn!(?err, failures = attempts.failures(), "page fetch failed");

                if !retry_allowed {
                    tracing::warn!("retry limit reached, giving up on page");
                    break None;
                }
                if !deps.prompt.confirm_retry().await {
                    tracing::info!("retry declined");
                    break None;
                }

                let _ = events.send(Event::Loading {
                    generation,
                    is_loading: true,
                });
                if let Some(delay) = attempts.next_delay() {
                    tokio::time::sleep(delay).await;
                }
            },
        }
    };

    let outcome = match fetched {
        Some(coins) if !coins.is_empty() => {
            deps.cache.save(&coins);
            PageOutcome {
                coins,
                from_network: true,
            }
        },
        _ => {
            let coins = deps.cache.load();
            tracing::info!(cached = coins.len(), "using cached coins");
            PageOutcome {
                coins,
                from_network: false,
            }
        },
    };

    let _ = events.send(Event::PageResolved {
        generation,
        page,
        outcome,
    });
}
