use tokio::sync::{mpsc, watch};

use super::{Command, SyncMode};
use crate::{
    arrange::{FilterOption, SortOption},
    coin::Coin,
    error::{SyncError, SyncResult},
    pagination::PaginationState,
};

/// Cloneable front end of a running [`CoinListSync`](super::CoinListSync).
///
/// Triggers are queued and applied by the actor in order. Every method fails with
/// [`SyncError::Closed`] once the actor has stopped.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    visible: watch::Receiver<Vec<Coin>>,
    is_loading: watch::Receiver<bool>,
    pagination: watch::Receiver<PaginationState>,
    mode: watch::Receiver<SyncMode>,
}

impl SyncHandle {
    pub(super) fn new(
        commands: mpsc::UnboundedSender<Command>,
        visible: watch::Receiver<Vec<Coin>>,
        is_loading: watch::Receiver<bool>,
        pagination: watch::Receiver<PaginationState>,
        mode: watch::Receiver<SyncMode>,
    ) -> Self {
        Self {
            commands,
            visible,
            is_loading,
            pagination,
            mode,
        }
    }

    /// Initial load of the first page.
    pub fn load(&self) -> SyncResult<()> {
        self.send(Command::Load)
    }

    /// Pull to refresh, restarts pagination from the first page.
    pub fn refresh(&self) -> SyncResult<()> {
        self.send(Command::Refresh)
    }

    /// Requests the next page unless one is in flight or the list is exhausted.
    pub fn reached_bottom(&self) -> SyncResult<()> {
        self.send(Command::ReachedBottom)
    }

    pub fn search_text_changed(&self, text: impl Into<String>) -> SyncResult<()> {
        self.send(Command::SearchTextChanged(text.into()))
    }

    pub fn select_sort(&self, sort: Option<SortOption>) -> SyncResult<()> {
        self.send(Command::SelectSort(sort))
    }

    pub fn select_filter(&self, filter: Option<FilterOption>) -> SyncResult<()> {
        self.send(Command::SelectFilter(filter))
    }

    /// Toggles the favorite flag of the coin shown at `index` of the visible list.
    ///
    /// The index is resolved to a coin id right away, so later list updates cannot redirect the
    /// toggle to another coin. Returns the id, or `None` when the index is out of range.
    pub fn toggle_favorite_at(&self, index: usize) -> SyncResult<Option<String>> {
        let id = self.visible.borrow().get(index).map(|coin| coin.id.clone());

        let Some(id) = id else {
            tracing::debug!(index, "favorite toggle outside of the visible list ignored");
            return Ok(None);
        };

        self.toggle_favorite(id.clone())?;
        Ok(Some(id))
    }

    pub fn toggle_favorite(&self, id: impl Into<String>) -> SyncResult<()> {
        self.send(Command::ToggleFavorite(id.into()))
    }

    pub fn visible(&self) -> watch::Receiver<Vec<Coin>> {
        self.visible.clone()
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.is_loading.clone()
    }

    pub fn pagination(&self) -> watch::Receiver<PaginationState> {
        self.pagination.clone()
    }

    pub fn mode(&self) -> watch::Receiver<SyncMode> {
        self.mode.clone()
    }

    /// Snapshot of the visible list.
    pub fn visible_coins(&self) -> Vec<Coin> {
        self.visible.borrow().clone()
    }

    fn send(&self, command: Command) -> SyncResult<()> {
        self.commands.send(command).map_err(|_| SyncError::Closed)
    }
}
