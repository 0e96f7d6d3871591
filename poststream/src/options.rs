/// Four days, in milliseconds.
pub const DEFAULT_TIME_GAP_MS: i64 = 4 * 24 * 60 * 60 * 1000;

/// Number of posts requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Configuration for [`crate::StreamState`] and [`crate::WindowRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamOptions {
    pub page_size: usize,
    /// Consecutive posts further apart than this get a time-gap marker (strictly greater).
    pub time_gap_ms: i64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            time_gap_ms: DEFAULT_TIME_GAP_MS,
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_time_gap_ms(mut self, time_gap_ms: i64) -> Self {
        self.time_gap_ms = time_gap_ms;
        self
    }
}
