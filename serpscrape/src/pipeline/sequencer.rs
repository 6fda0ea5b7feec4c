//! Offset arithmetic for successive result pages.

use serde::{Deserialize, Serialize};

/// Page number and offset of the page after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Continuation {
    /// 1-based page number of the next page.
    pub next_page: Option<usize>,
    /// Zero-based offset of the next page.
    pub next_start: Option<usize>,
}

impl Continuation {
    /// The end-of-stream continuation.
    pub const EXHAUSTED: Self = Self {
        next_page: None,
        next_start: None,
    };

    /// Whether no next page exists.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next_start.is_none()
    }

    /// As a `(next_page, next_start)` pair.
    #[must_use]
    pub fn into_pair(self) -> (Option<usize>, Option<usize>) {
        (self.next_page, self.next_start)
    }
}

/// Computes where the next page starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageSequencer;

impl PageSequencer {
    /// Continuation after fetching `fetched` results at `start` with a page
    /// size of `page_size`.
    ///
    /// Zero fetched results mean the stream is exhausted. Otherwise the next
    /// page starts one page size later; this says where a next page would
    /// be, not that it holds results. A zero page size is treated as an
    /// exhausted stream.
    #[must_use]
    pub const fn next_page(start: usize, page_size: usize, fetched: usize) -> Continuation {
        if fetched == 0 || page_size == 0 {
            return Continuation::EXHAUSTED;
        }

        let current_page = start / page_size + 1;
        Continuation {
            next_page: Some(current_page + 1),
            next_start: Some(start + page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_basic() {
        let next = PageSequencer::next_page(0, 10, 10);
        assert_eq!(next.next_page, Some(2));
        assert_eq!(next.next_start, Some(10));
    }

    #[test]
    fn test_next_page_none_when_no_fetch() {
        let next = PageSequencer::next_page(20, 10, 0);
        assert_eq!(next, Continuation::EXHAUSTED);
        assert!(next.is_exhausted());
    }

    #[test]
    fn test_zero_fetched_is_always_exhausted() {
        for start in [0, 1, 9, 10, 99, 1000] {
            for page_size in [1, 7, 10, 100] {
                assert_eq!(
                    PageSequencer::next_page(start, page_size, 0).into_pair(),
                    (None, None)
                );
            }
        }
    }

    #[test]
    fn test_positive_fetch_uses_integer_division() {
        for start in [0, 3, 10, 15, 99, 250] {
            for page_size in [1, 7, 10, 100] {
                for fetched in [1, page_size, page_size + 5] {
                    let next = PageSequencer::next_page(start, page_size, fetched);
                    assert_eq!(
                        next.into_pair(),
                        (Some(start / page_size + 2), Some(start + page_size))
                    );
                }
            }
        }
    }

    #[test]
    fn test_unaligned_start() {
        // start 15 with page size 10 is inside page 2
        let next = PageSequencer::next_page(15, 10, 3);
        assert_eq!(next.into_pair(), (Some(3), Some(25)));
    }

    #[test]
    fn test_zero_page_size() {
        assert!(PageSequencer::next_page(0, 0, 5).is_exhausted());
    }
}
