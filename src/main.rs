use std::{io::IsTerminal, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use coin_sync::{
    alerts::{LogNotifier, PriceAlerts},
    arrange::{FilterOption, SortOption},
    cache::FileCoinCache,
    coin::Coin,
    coingecko_client::CoingeckoClient,
    favorites::FavoritesStore,
    fetcher::{DeclineRetry, RetryPrompt},
    kv_store::JsonFileStore,
    pagination::PaginationState,
    settings::{try_read_settings, SyncSettings, DEFAULT_SETTINGS_FILE},
    telemetry::Telemetry,
    CoinListSync, SyncDeps,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
};

/// Fetches the coin market list, merges it with the local cache and favorites and prints it.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Settings file. Environment variables like COIN_SYNC__PAGINATION__PER_PAGE override it.
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: String,
    /// One of price_asc, price_desc, name_az, name_za.
    #[arg(long)]
    sort: Option<SortOption>,
    /// One of top10, price_above1.
    #[arg(long)]
    filter: Option<FilterOption>,
    /// Show remote search results instead of the market list.
    #[arg(long)]
    search: Option<String>,
    /// Market pages to load.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

/// Asks on the terminal before retrying a failed page.
struct StdinPrompt;

#[async_trait]
impl RetryPrompt for StdinPrompt {
    async fn confirm_retry(&self) -> bool {
        eprint!("Unable to load coins. Retry? [y/N] ");

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(err) => {
                tracing::warn!(%err, "unable to read retry answer");
                false
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = try_read_settings(&cli.config);
    let tracing_settings = settings
        .as_ref()
        .map(|settings| settings.tracing.clone())
        .unwrap_or_default();
    Telemetry::init_subscriber(Telemetry::init(env!("CARGO_PKG_NAME").into(), &tracing_settings))?;

    let settings = settings.unwrap_or_else(|err| {
        tracing::warn!(kind = err.kind(), %err, "config error, going on with default config...");
        SyncSettings::default()
    });

    let handle = CoinListSync::spawn(build_deps(&settings)?, settings.sync_options());
    handle.select_filter(cli.filter)?;
    handle.select_sort(cli.sort)?;

    let mut pagination = handle.pagination();
    pagination.borrow_and_update();
    handle.load()?;
    let mut state = next_settled_page(&mut pagination).await?;

    for _ in 1..cli.pages {
        if !state.has_more_pages {
            break;
        }
        handle.reached_bottom()?;
        state = next_settled_page(&mut pagination).await?;
    }

    if let Some(query) = cli.search {
        let mut visible = handle.visible();
        visible.borrow_and_update();
        handle.search_text_changed(query)?;
        visible.changed().await.context("Coin list sync stopped")?;
    }

    print_coins(&handle.visible_coins());

    Ok(())
}

fn build_deps(settings: &SyncSettings) -> anyhow::Result<SyncDeps> {
    let fetcher = CoingeckoClient::new(settings.coingecko.clone())?;
    let cache = FileCoinCache::new(&settings.cache.path, settings.cache.ttl);
    let favorites = FavoritesStore::new(
        settings.favorites.key.clone(),
        Arc::new(JsonFileStore::new(&settings.favorites.path)),
    );

    let prompt: Arc<dyn RetryPrompt> = if std::io::stdin().is_terminal() {
        Arc::new(StdinPrompt)
    } else {
        Arc::new(DeclineRetry)
    };

    let alerts = settings
        .alerts
        .threshold_percent
        .map(|threshold| Arc::new(PriceAlerts::new(threshold, Arc::new(LogNotifier))));

    Ok(SyncDeps {
        fetcher: Arc::new(fetcher),
        cache: Arc::new(cache),
        favorites: Arc::new(favorites),
        prompt,
        alerts,
    })
}

/// Waits until the page request issued after the last seen update has resolved.
async fn next_settled_page(pagination: &mut watch::Receiver<PaginationState>) -> anyhow::Result<PaginationState> {
    loop {
        pagination.changed().await.context("Coin list sync stopped")?;
        let state = *pagination.borrow_and_update();
        if !state.is_loading_page {
            return Ok(state);
        }
    }
}

fn print_coins(coins: &[Coin]) {
    for (position, coin) in coins.iter().enumerate() {
        println!(
            "{:>4}  {} {:<28} {:<8} {:>16.6}",
            position + 1,
            if coin.is_favorite { '*' } else { ' ' },
            coin.name,
            coin.symbol.to_uppercase(),
            coin.price,
        );
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}
