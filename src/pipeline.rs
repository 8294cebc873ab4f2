//! Derivation of the displayed page from the raw records.
//!
//! Every stage works on row indices into the raw record slice, the records
//! themselves are never copied or reordered. The stages run in a fixed order:
//! sort, global filter, column-scoped filter, paginate.

use std::num::NonZeroUsize;

use tracing::debug;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct SortState {
    /// `None` keeps the raw input order.
    pub key: Option<String>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: None,
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub global_text: String,
    pub column_scope: Option<String>,
}

impl FilterState {
    /// Lower-cased search text, or `None` when the text is blank.
    pub fn needle(&self) -> Option<String> {
        if self.global_text.trim().is_empty() {
            None
        } else {
            Some(self.global_text.to_lowercase())
        }
    }
}

/// Result of one pipeline evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    /// Indices into the raw records for the current page, in display order.
    pub rows: Vec<usize>,
    pub total_pages: usize,
    /// Records left after both filter stages.
    pub total_filtered_count: usize,
    /// Records left after the global filter stage only.
    pub global_match_count: usize,
}

pub fn sort_rows(records: &[Record], sort: &SortState) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..records.len()).collect();
    if let Some(key) = &sort.key {
        // sort_by is stable, ties keep input order in both directions
        rows.sort_by(|&a, &b| {
            let ord = records[a].get(key).compare(records[b].get(key));
            if sort.ascending { ord } else { ord.reverse() }
        });
    }
    rows
}

pub fn global_filter(records: &[Record], rows: Vec<usize>, filter: &FilterState) -> Vec<usize> {
    let Some(needle) = filter.needle() else {
        return rows;
    };
    rows.into_iter()
        .filter(|&idx| {
            records[idx]
                .values()
                .any(|v| v.to_string().to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn column_filter(records: &[Record], rows: Vec<usize>, filter: &FilterState) -> Vec<usize> {
    let (Some(column), Some(needle)) = (&filter.column_scope, filter.needle()) else {
        return rows;
    };
    rows.into_iter()
        .filter(|&idx| {
            records[idx]
                .get(column)
                .to_string()
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}

pub fn total_pages(count: usize, page_size: NonZeroUsize) -> usize {
    count.div_ceil(page_size.get()).max(1)
}

/// Rows of the 1-based `page`. Pages past the end are empty.
pub fn paginate(rows: &[usize], page: usize, page_size: NonZeroUsize) -> Vec<usize> {
    let begin = page.saturating_sub(1).saturating_mul(page_size.get());
    rows.iter()
        .skip(begin)
        .take(page_size.get())
        .copied()
        .collect()
}

pub fn evaluate(
    records: &[Record],
    sort: &SortState,
    filter: &FilterState,
    page: usize,
    page_size: NonZeroUsize,
) -> PageView {
    let sorted = sort_rows(records, sort);
    let matched = global_filter(records, sorted, filter);
    let global_match_count = matched.len();
    let filtered = column_filter(records, matched, filter);

    let view = PageView {
        rows: paginate(&filtered, page, page_size),
        total_pages: total_pages(filtered.len(), page_size),
        total_filtered_count: filtered.len(),
        global_match_count,
    };
    debug!(
        "Pipeline: sort {:?}, filter {:?}, page {}/{}, {} of {} records match",
        sort,
        filter,
        page,
        view.total_pages,
        view.total_filtered_count,
        records.len()
    );
    view
}
