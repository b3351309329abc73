use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Most page numbers shown at once in the pagination bar
pub const PAGE_WINDOW: usize = 5;

/// Which count pagination is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountPolicy {
    /// Records left after filtering
    #[default]
    Filtered,
    /// Records returned by the last fetch, before filtering
    Raw,
}

impl std::str::FromStr for CountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filtered" => Ok(CountPolicy::Filtered),
            "raw" => Ok(CountPolicy::Raw),
            other => Err(format!("unknown count policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub page_size: usize,
    /// 1-based
    pub current_page: usize,
    pub total_count: usize,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_count: 0,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }

    /// Highest page a caller may land on; 1 even when there is nothing to show
    pub fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    pub fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.last_page())
    }

    /// Index range of the current page within a sequence of `len` items
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.current_page.saturating_sub(1).saturating_mul(self.page_size).min(len);
        let end = start.saturating_add(self.page_size).min(len);
        start..end
    }

    pub fn metadata(&self) -> PaginationMetadata {
        let total_pages = self.total_pages();
        PaginationMetadata {
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages,
            has_prev: self.current_page > 1,
            has_next: self.current_page < total_pages,
            page_numbers: page_window(self.current_page, total_pages),
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// What the pagination controls need to render
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PaginationMetadata {
    pub current_page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub page_numbers: Vec<usize>,
}

/// Up to [`PAGE_WINDOW`] consecutive page numbers around `current`
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(PAGE_WINDOW / 2).max(1);
    let end = start.saturating_add(PAGE_WINDOW - 1).min(total_pages);
    if end - start + 1 < PAGE_WINDOW {
        start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
    }
    (start..=end).collect()
}
