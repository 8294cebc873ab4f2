use std::num::NonZeroUsize;

use tracing::trace;

use crate::columns::ColumnRegistry;
use crate::pipeline::{FilterState, SortState};

/// Interaction state of one table session.
///
/// Every transition is total: invalid requests are ignored, never reported.
#[derive(Debug, Clone)]
pub struct TableState {
    pub columns: ColumnRegistry,
    pub sort: SortState,
    pub filter: FilterState,
    pub page_size: NonZeroUsize,
    current_page: usize,
    dragged_index: Option<usize>,
}

impl TableState {
    pub fn new(columns: ColumnRegistry, page_size: NonZeroUsize) -> Self {
        Self {
            columns,
            sort: SortState::default(),
            filter: FilterState::default(),
            page_size,
            current_page: 1,
            dragged_index: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn dragged_index(&self) -> Option<usize> {
        self.dragged_index
    }

    /// Sort by `key`, or flip the direction if it already is the sort key.
    pub fn set_sort(&mut self, key: &str) {
        if !self.columns.contains(key) {
            trace!("Ignoring sort on unknown column \"{key}\"");
            return;
        }
        if self.sort.key.as_deref() == Some(key) {
            self.sort.ascending = !self.sort.ascending;
        } else {
            self.sort.key = Some(key.to_string());
            self.sort.ascending = true;
        }
        trace!("Sort: {:?}", self.sort);
    }

    pub fn set_global_filter(&mut self, text: &str) {
        self.filter.global_text = text.to_string();
        self.current_page = 1;
        trace!("Global filter: \"{text}\"");
    }

    /// Scopes the search to `column_id`. The text box is shared with the global filter.
    pub fn set_column_filter(&mut self, column_id: &str, text: &str) {
        if !self.columns.contains(column_id) {
            trace!("Ignoring filter on unknown column \"{column_id}\"");
            return;
        }
        self.filter.column_scope = Some(column_id.to_string());
        self.filter.global_text = text.to_string();
        trace!("Column filter: {column_id} \"{text}\"");
    }

    pub fn clear_search(&mut self) {
        self.filter = FilterState::default();
        trace!("Search cleared");
    }

    /// Returns `true` if `page` was within `1..=total_pages` and got selected.
    pub fn set_page(&mut self, page: usize, total_pages: usize) -> bool {
        if page < 1 || page > total_pages {
            trace!("Ignoring page {page} of {total_pages}");
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next_page(&mut self, total_pages: usize) -> bool {
        self.set_page(self.current_page + 1, total_pages)
    }

    pub fn prev_page(&mut self, total_pages: usize) -> bool {
        self.set_page(self.current_page.saturating_sub(1), total_pages)
    }

    /// Pulls the current page back into range after the result set shrank.
    pub fn clamp_page(&mut self, total_pages: usize) {
        let last = total_pages.max(1);
        if self.current_page > last {
            trace!("Clamping page {} to {last}", self.current_page);
            self.current_page = last;
        }
    }

    pub fn start_drag(&mut self, index: usize) {
        if index >= self.columns.len() {
            trace!("Ignoring drag start on column {index}");
            return;
        }
        self.dragged_index = Some(index);
    }

    /// Moves the dragged column to `index` and keeps dragging it from there.
    pub fn drag_over(&mut self, index: usize) {
        let Some(dragged) = self.dragged_index else {
            return;
        };
        if self.columns.move_column(dragged, index) {
            self.dragged_index = Some(index);
        }
    }

    pub fn end_drag(&mut self) {
        self.dragged_index = None;
    }
}
