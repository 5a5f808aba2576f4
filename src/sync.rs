//! Coin list synchronization.
//!
//! [`CoinListSync`] runs as a single tokio task that owns every piece of list state. Triggers
//! arrive through a [`SyncHandle`], network work runs in helper tasks and their outcomes are
//! sent back as events, so the state is only ever touched from the actor's own loop.
//! Results are published on `watch` channels, which replay the latest value to new subscribers.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};

use crate::{
    alerts::PriceAlerts,
    arrange::{arrange, FilterOption, SortOption},
    cache::CoinCache,
    coin::Coin,
    favorites::{overlay, FavoriteSet, FavoritesStore},
    fetcher::{CoinFetcher, RetryPrompt},
    pagination::{PaginationState, DEFAULT_PER_PAGE},
    retry::RetryPolicy,
};

mod handle;
mod page;

pub use handle::SyncHandle;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Paginated market list.
    Browse,
    /// Results of the last remote search.
    Search,
}

/// Collaborators of the orchestrator, wired explicitly by the caller.
#[derive(Clone)]
pub struct SyncDeps {
    pub fetcher: Arc<dyn CoinFetcher>,
    pub cache: Arc<dyn CoinCache>,
    pub favorites: Arc<FavoritesStore>,
    pub prompt: Arc<dyn RetryPrompt>,
    pub alerts: Option<Arc<PriceAlerts>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub per_page: u32,
    pub search_debounce: Duration,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug)]
enum Command {
    Load,
    Refresh,
    ReachedBottom,
    SearchTextChanged(String),
    SelectSort(Option<SortOption>),
    SelectFilter(Option<FilterOption>),
    ToggleFavorite(String),
}

#[derive(Debug)]
enum Event {
    Loading { generation: u64, is_loading: bool },
    PageResolved { generation: u64, page: u32, outcome: page::PageOutcome },
    SearchResolved { generation: u64, query: String, coins: Vec<Coin> },
}

struct PendingSearch {
    query: String,
    deadline: Instant,
}

struct Outputs {
    visible: watch::Sender<Vec<Coin>>,
    is_loading: watch::Sender<bool>,
    pagination: watch::Sender<PaginationState>,
    mode: watch::Sender<SyncMode>,
}

pub struct CoinListSync {
    deps: SyncDeps,
    options: SyncOptions,
    events: mpsc::UnboundedSender<Event>,
    outputs: Outputs,

    pagination: PaginationState,
    page_generation: u64,
    browse: Vec<Coin>,

    mode: SyncMode,
    search_results: Vec<Coin>,
    pending_search: Option<PendingSearch>,
    last_query: Option<String>,
    search_generation: u64,

    sort: Option<SortOption>,
    filter: Option<FilterOption>,
    favorites: FavoriteSet,
}

impl CoinListSync {
    /// Starts the actor on the current tokio runtime. It stops once every handle is dropped.
    pub fn spawn(deps: SyncDeps, options: SyncOptions) -> SyncHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pagination = PaginationState::new(options.per_page);
        let (visible, visible_rx) = watch::channel(Vec::new());
        let (is_loading, is_loading_rx) = watch::channel(false);
        let (pagination_tx, pagination_rx) = watch::channel(pagination);
        let (mode, mode_rx) = watch::channel(SyncMode::Browse);

        let favorites_rx = deps.favorites.subscribe();
        let favorites = favorites_rx.borrow().clone();

        let sync = Self {
            deps,
            options,
            events: events_tx,
            outputs: Outputs {
                visible,
                is_loading,
                pagination: pagination_tx,
                mode,
            },
            pagination,
            page_generation: 0,
            browse: Vec::new(),
            mode: SyncMode::Browse,
            search_results: Vec::new(),
            pending_search: None,
            last_query: None,
            search_generation: 0,
            sort: None,
            filter: None,
            favorites,
        };

        tokio::spawn(sync.run(commands_rx, events_rx, favorites_rx));

        SyncHandle::new(commands_tx, visible_rx, is_loading_rx, pagination_rx, mode_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
        mut favorites: watch::Receiver<FavoriteSet>,
    ) {
        let mut favorites_open = true;

        loop {
            let search_deadline = self.pending_search.as_ref().map(|pending| pending.deadline);

            // User triggers go first so a scroll that arrived during a fetch is judged against
            // the in-flight guard.
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
                changed = favorites.changed(), if favorites_open => match changed {
                    Ok(()) => {
                        let updated = favorites.borrow_and_update().clone();
                        self.apply_favorites(updated);
                    },
                    Err(_) => favorites_open = false,
                },
                _ = tokio::time::sleep_until(search_deadline.unwrap_or_else(Instant::now)), if search_deadline.is_some() => {
                    self.issue_search();
                },
            }
        }

        tracing::debug!("coin list sync stopped");
    }

    fn handle_command(&mut self, command: Command) {
        tracing::trace!(?command, "command received");

        match command {
            Command::Load | Command::Refresh => self.reload(),
            Command::ReachedBottom => {
                if self.pagination.can_load_more() {
                    self.start_page_fetch();
                } else {
                    tracing::debug!(pagination = ?self.pagination, "next page request dropped");
                }
            },
            Command::SearchTextChanged(text) => self.search_text_changed(text),
            Command::SelectSort(sort) => {
                self.sort = sort;
                self.publish_visible();
            },
            Command::SelectFilter(filter) => {
                self.filter = filter;
                self.publish_visible();
            },
            Command::ToggleFavorite(id) => {
                if self.deps.favorites.contains(&id) {
                    self.deps.favorites.remove_id(&id);
                } else {
                    self.deps.favorites.add_id(&id);
                }
            },
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Loading { generation, is_loading } => {
                if generation == self.page_generation && self.pagination.is_loading_page {
                    self.outputs.is_loading.send_replace(is_loading);
                }
            },
            Event::PageResolved {
                generation,
                page,
                outcome,
            } => {
                if generation != self.page_generation {
                    tracing::debug!(generation, page, "superseded page result dropped");
                    return;
                }
                self.apply_page(page, outcome);
            },
            Event::SearchResolved {
                generation,
                query,
                coins,
            } => {
                if generation != self.search_generation || self.mode != SyncMode::Search {
                    tracing::debug!(%query, "superseded search result dropped");
                    return;
                }
                self.search_results = dedup_by_id(coins);
                overlay(&mut self.search_results, &self.favorites);
                self.publish_visible();
            },
        }
    }

    /// Load and refresh: back to the first page, superseding any page in flight.
    fn reload(&mut self) {
        self.pagination.reset();
        self.start_page_fetch();
    }

    fn start_page_fetch(&mut self) {
        self.page_generation += 1;
        self.pagination.is_loading_page = true;
        self.outputs.pagination.send_replace(self.pagination);
        self.outputs.is_loading.send_replace(true);

        let request = page::PageRequest {
            generation: self.page_generation,
            page: self.pagination.current_page,
            per_page: self.pagination.per_page,
        };
        tracing::debug!(page = request.page, generation = request.generation, "fetching page");

        tokio::spawn(page::fetch_page(
            request,
            self.deps.clone(),
            self.options.retry.clone(),
            self.events.clone(),
        ));
    }

    fn apply_page(&mut self, page: u32, outcome: page::PageOutcome) {
        let page::PageOutcome { coins, from_network } = outcome;

        self.pagination.advance(coins.len());

        if from_network && page == 1 {
            if let Some(alerts) = &self.deps.alerts {
                alerts.check(&coins);
            }
        }

        if page == 1 {
            self.browse.clear();
        }

        let mut known: HashSet<String> = self.browse.iter().map(|coin| coin.id.clone()).collect();
        let mut fresh: Vec<Coin> = coins.into_iter().filter(|coin| known.insert(coin.id.clone())).collect();
        overlay(&mut fresh, &self.favorites);

        tracing::info!(
            page,
            from_network,
            appended = fresh.len(),
            total = self.browse.len() + fresh.len(),
            has_more_pages = self.pagination.has_more_pages,
            "page applied"
        );
        self.browse.extend(fresh);

        self.pagination.is_loading_page = false;
        self.outputs.pagination.send_replace(self.pagination);
        self.outputs.is_loading.send_replace(false);

        if self.mode == SyncMode::Browse {
            self.publish_visible();
        }
    }

    fn search_text_changed(&mut self, text: String) {
        let query = text.trim();

        if !query.is_empty() {
            self.set_mode(SyncMode::Search);
            self.pending_search = Some(PendingSearch {
                query: query.to_owned(),
                deadline: Instant::now() + self.options.search_debounce,
            });
            return;
        }

        self.pending_search = None;
        self.last_query = None;
        self.search_generation += 1;
        self.search_results.clear();
        self.set_mode(SyncMode::Browse);

        let mut cached = self.deps.cache.load();
        if cached.is_empty() {
            tracing::debug!("coin cache is empty, refreshing");
            self.reload();
            return;
        }

        overlay(&mut cached, &self.favorites);
        self.browse = cached;
        self.publish_visible();
    }

    fn issue_search(&mut self) {
        let Some(PendingSearch { query, .. }) = self.pending_search.take() else {
            return;
        };

        if self.last_query.as_deref() == Some(query.as_str()) {
            tracing::debug!(%query, "repeated search dropped");
            return;
        }

        self.last_query = Some(query.clone());
        self.search_generation += 1;

        let generation = self.search_generation;
        let fetcher = self.deps.fetcher.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let coins = fetcher.search(&query).await.unwrap_or_else(|err| {
                tracing::warn!(%query, ?err, "search failed, showing no results");
                Vec::new()
            });

            let _ = events.send(Event::SearchResolved {
                generation,
                query,
                coins,
            });
        });
    }

    fn apply_favorites(&mut self, favorites: FavoriteSet) {
        overlay(&mut self.browse, &favorites);
        overlay(&mut self.search_results, &favorites);
        self.favorites = favorites;
        self.publish_visible();
    }

    fn set_mode(&mut self, mode: SyncMode) {
        if self.mode != mode {
            tracing::debug!(?mode, "mode changed");
            self.mode = mode;
            self.outputs.mode.send_replace(mode);
        }
    }

    fn publish_visible(&self) {
        let working_set = match self.mode {
            SyncMode::Browse => &self.browse,
            SyncMode::Search => &self.search_results,
        };

        self.outputs
            .visible
            .send_replace(arrange(working_set, self.filter, self.sort));
    }
}

/// Keeps the first coin seen for every id.
fn dedup_by_id(coins: Vec<Coin>) -> Vec<Coin> {
    let mut seen = HashSet::new();
    coins.into_iter().filter(|coin| seen.insert(coin.id.clone())).collect()
}
