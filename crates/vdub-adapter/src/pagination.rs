/*
[INPUT]:  Current page and total page count
[OUTPUT]: Visible page-number window; validated page navigation
[POS]:    Pure algorithm - task list page buttons
[UPDATE]: When the window width or navigation rules change
*/

/// Number of page buttons shown at most.
pub const PAGE_WINDOW: u32 = 5;

/// Page numbers to show, always `min(5, total_pages)` long.
///
/// The window is centered on `current_page` and clamps at both ends of
/// `1..=total_pages`.
pub fn windowed_pages(current_page: u32, total_pages: u32) -> Vec<u32> {
    let width = PAGE_WINDOW.min(total_pages);
    let start = if total_pages <= PAGE_WINDOW || current_page <= 3 {
        1
    } else if current_page >= total_pages - 2 {
        total_pages - (PAGE_WINDOW - 1)
    } else {
        current_page - 2
    };
    (start..start + width).collect()
}

/// Page state of a list view.
///
/// Requests outside `1..=total_pages` are rejected as no-ops; the current
/// page never moves to a page other than the one requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNavigator {
    page: u32,
    total_pages: u32,
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageNavigator {
    pub fn new() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Total pages used for bounds; an empty list counts as one page.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Record the page count reported by the latest list response.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages.max(1);
    }

    /// Move to `new_page` if it is in range. Returns whether the page changed.
    pub fn request(&mut self, new_page: u32) -> bool {
        if new_page < 1 || new_page > self.total_pages {
            tracing::debug!(
                requested = new_page,
                total_pages = self.total_pages,
                "ignoring out-of-range page request"
            );
            return false;
        }
        let changed = self.page != new_page;
        self.page = new_page;
        changed
    }

    pub fn next(&mut self) -> bool {
        self.request(self.page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.request(self.page.saturating_sub(1))
    }

    /// Back to the first page, as after changing the status filter.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// A pagination bar is only worth showing for more than one page.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    pub fn visible_pages(&self) -> Vec<u32> {
        windowed_pages(self.page, self.total_pages)
    }
}
