//! Offset pagination over creation-ordered collections.

use std::ops::Range;

use paywire_common::{LedgerError, Result};

/// Limit applied when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest limit a caller may request.
pub const MAX_PAGE_LIMIT: usize = 50;

/// Bounds applied to caller-supplied page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Limit used when none is given.
    pub default_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items.
    pub limit: usize,
    /// Zero-based offset of the first item.
    pub next: usize,
}

impl PageRequest {
    /// Create a page request without validation.
    pub fn new(limit: usize, next: usize) -> Self {
        Self { limit, next }
    }

    /// Build a request from optional caller input, applying defaults and
    /// rejecting limits above the maximum.
    pub fn from_query(limit: Option<usize>, next: Option<usize>, limits: &PageLimits) -> Result<Self> {
        let limit = limit.unwrap_or(limits.default_limit);
        if limit > limits.max_limit {
            return Err(LedgerError::invalid(
                "limit",
                format!("limit > {}", limits.max_limit),
            ));
        }
        Ok(Self::new(limit, next.unwrap_or(0)))
    }

    /// Index range selected in a collection of `len` items.
    ///
    /// The limit is clipped to what remains after `next`; an offset at or
    /// past the end selects nothing.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.next.min(len);
        let end = start + self.limit.min(len - start);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clips_limit() {
        assert_eq!(PageRequest::new(5, 0).window(10), 0..5);
        assert_eq!(PageRequest::new(5, 5).window(10), 5..10);
        assert_eq!(PageRequest::new(5, 8).window(10), 8..10);
    }

    #[test]
    fn test_window_past_end_is_empty() {
        assert!(PageRequest::new(5, 10).window(10).is_empty());
        assert!(PageRequest::new(5, 99).window(10).is_empty());
        assert!(PageRequest::new(5, 0).window(0).is_empty());
    }

    #[test]
    fn test_from_query_defaults_and_max() {
        let limits = PageLimits::default();

        let request = PageRequest::from_query(None, None, &limits).unwrap();
        assert_eq!(request, PageRequest::new(DEFAULT_PAGE_LIMIT, 0));

        let request = PageRequest::from_query(Some(50), Some(3), &limits).unwrap();
        assert_eq!(request, PageRequest::new(50, 3));

        assert!(PageRequest::from_query(Some(51), None, &limits).is_err());
    }
}
