//! Offset/limit window over a grant's applications.

use crate::review::payload::ApplicationQuery;

pub const DEFAULT_PAGE_LENGTH: usize = 20;
/// Effectively unbounded window used while a search filter is active.
pub const SEARCH_PAGE_LENGTH: usize = 999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    skip: usize,
    length: usize,
    search_text: String,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LENGTH)
    }
}

impl PageWindow {
    /// A zero length falls back to the default.
    pub fn new(length: usize) -> Self {
        Self {
            skip: 0,
            length: if length == 0 { DEFAULT_PAGE_LENGTH } else { length },
            search_text: String::new(),
        }
    }

    pub fn skip(&self) -> usize {
        if self.is_search_mode() {
            0
        } else {
            self.skip
        }
    }

    pub fn length(&self) -> usize {
        if self.is_search_mode() {
            SEARCH_PAGE_LENGTH
        } else {
            self.length
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn is_search_mode(&self) -> bool {
        !self.search_text.trim().is_empty()
    }

    pub fn can_next(&self, total: u64) -> bool {
        !self.is_search_mode()
            && self.skip % self.length == 0
            && ((self.skip + self.length) as u64) < total
    }

    pub fn can_previous(&self) -> bool {
        !self.is_search_mode() && self.skip > 0
    }

    /// Advance one page; returns false (and changes nothing) at the end of the list.
    pub fn next(&mut self, total: u64) -> bool {
        if !self.can_next(total) {
            return false;
        }
        self.skip += self.length;
        true
    }

    /// Step back one page, flooring at zero; returns false when already on the first page.
    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.skip = self.skip.saturating_sub(self.length);
        true
    }

    /// Enter, update or leave search mode. Any change resets the window to the first page.
    /// Surrounding whitespace is ignored. Returns whether the search text changed.
    pub fn set_search(&mut self, text: &str) -> bool {
        let text = text.trim();
        if self.search_text == text {
            return false;
        }
        self.search_text = text.to_string();
        self.skip = 0;
        true
    }

    pub fn query(&self) -> ApplicationQuery {
        ApplicationQuery {
            search_text: self.search_text.clone(),
            length: self.length(),
            skip: self.skip(),
        }
    }

    /// Footer text: a range while paging, a result count while searching.
    pub fn range_label(&self, total: u64, visible: usize) -> String {
        if self.is_search_mode() {
            let noun = if visible == 1 { "result" } else { "results" };
            return format!("Found {visible} {noun}");
        }
        if total == 0 {
            return "Showing 0 of 0".to_string();
        }
        let first = self.skip + 1;
        let last = ((self.skip + self.length) as u64).min(total);
        format!("Showing {first} to {last} of {total}")
    }
}
