pub const DEFAULT_PER_PAGE: u32 = 25;

/// Cursor of the incremental market list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub per_page: u32,
    pub has_more_pages: bool,
    /// Set while a page request is in flight.
    pub is_loading_page: bool,
}

impl PaginationState {
    pub fn new(per_page: u32) -> Self {
        Self {
            current_page: 1,
            per_page: per_page.max(1),
            has_more_pages: true,
            is_loading_page: false,
        }
    }

    /// Back to the first page, used by load and refresh.
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.has_more_pages = true;
    }

    /// Whether a scroll to the bottom may request another page.
    pub fn can_load_more(&self) -> bool {
        !self.is_loading_page && self.has_more_pages
    }

    /// Accounts for a resolved page with `count` coins.
    pub fn advance(&mut self, count: usize) {
        self.has_more_pages = count >= self.per_page as usize;
        if self.has_more_pages {
            self.current_page += 1;
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}
