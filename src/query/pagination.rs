//! Pagination State Module
//!
//! Page position of one query session and the page count derived from the
//! latest known total.

use crate::models::PageRequest;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// == Pagination State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: u32,
    page_size: u32,
    total_items: u64,
}

impl PaginationState {
    // == Constructor ==
    /// Starts at page 1 with no known items. A zero page size is bumped to 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    // == Total Pages ==
    /// `ceil(total_items / page_size)`, never less than 1.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_items.div_ceil(u64::from(self.page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// True if `page` lies in `[1, total_pages]`.
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages()
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.current_page, self.page_size)
    }

    // == Mutation ==
    /// Moves to `page` if it is in range; returns whether the page changed.
    pub(crate) fn go_to(&mut self, page: u32) -> bool {
        if !self.contains(page) || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Records a new total. If the current page no longer exists it moves
    /// to the last page; returns whether it moved.
    pub(crate) fn set_total_items(&mut self, total_items: u64) -> bool {
        self.total_items = total_items;
        let last_page = self.total_pages();
        if self.current_page > last_page {
            self.current_page = last_page;
            return true;
        }
        false
    }

    /// Back to page 1 with an unknown total, used when the query changes.
    pub(crate) fn reset(&mut self) {
        self.current_page = 1;
        self.total_items = 0;
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(page_size: u32, total_items: u64) -> PaginationState {
        let mut state = PaginationState::new(page_size);
        state.set_total_items(total_items);
        state
    }

    #[test]
    fn test_empty_result_is_one_page() {
        let state = state(10, 0);
        assert_eq!(state.total_pages(), 1);
        assert!(!state.has_next_page());
        assert!(!state.has_previous_page());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(state(10, 95).total_pages(), 10);
        assert_eq!(state(10, 100).total_pages(), 10);
        assert_eq!(state(10, 101).total_pages(), 11);
        assert_eq!(state(10, 1).total_pages(), 1);
    }

    #[test]
    fn test_zero_page_size_is_bumped() {
        assert_eq!(PaginationState::new(0).page_size(), 1);
    }

    #[test]
    fn test_go_to_out_of_range_is_noop() {
        let mut state = state(10, 95);

        assert!(!state.go_to(0));
        assert!(!state.go_to(11));
        assert_eq!(state.current_page(), 1);

        assert!(state.go_to(10));
        assert_eq!(state.current_page(), 10);
        assert!(!state.has_next_page());
        assert!(state.has_previous_page());
    }

    #[test]
    fn test_go_to_same_page_reports_no_change() {
        let mut state = state(10, 95);
        assert!(!state.go_to(1));
    }

    #[test]
    fn test_shrinking_total_clamps_current_page() {
        let mut state = state(10, 95);
        state.go_to(10);

        assert!(state.set_total_items(30));
        assert_eq!(state.current_page(), 3);
        assert!(!state.has_next_page());
        assert!(state.go_to(2));

        assert!(state.set_total_items(0));
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_growing_total_keeps_page() {
        let mut state = state(10, 30);
        state.go_to(3);

        assert!(!state.set_total_items(95));
        assert_eq!(state.current_page(), 3);
    }

    #[test]
    fn test_reset() {
        let mut state = state(10, 95);
        state.go_to(3);
        state.reset();

        assert_eq!(state.current_page(), 1);
        assert_eq!(state.total_items(), 0);
        assert_eq!(state.page_size(), 10);
    }

    #[test]
    fn test_page_request_offset() {
        let mut state = state(10, 95);
        state.go_to(3);
        assert_eq!(state.page_request().offset(), 20);
    }
}
