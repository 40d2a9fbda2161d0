//! Incremental delimiter matching.
//!
//! Both fence markers may straddle fragment boundaries, so matching always
//! runs against buffered text. A [`DelimiterScanner`] remembers how far it has
//! already looked so that repeated searches over a growing buffer only touch
//! the newly appended bytes plus a `needle.len() - 1` overlap.

/// Opening fence marker. The remainder of its line is the fence info line.
pub const OPENING_DELIMITER: &str = "```mermaid";

/// Closing fence marker.
pub const CLOSING_DELIMITER: &str = "```";

/// Resumable substring search over a buffer that only grows at the end
/// (or is drained from the front, after which [`DelimiterScanner::rebase`]
/// must be called).
#[derive(Debug, Clone)]
pub struct DelimiterScanner {
    needle: &'static str,
    resume_at: usize,
}

impl DelimiterScanner {
    pub fn new(needle: &'static str) -> Self {
        debug_assert!(!needle.is_empty());
        Self {
            needle,
            resume_at: 0,
        }
    }

    pub fn needle(&self) -> &'static str {
        self.needle
    }

    /// Searches `haystack` for the needle, starting where the previous
    /// unsuccessful search left off. Returns the byte offset of the match.
    pub fn find(&mut self, haystack: &str) -> Option<usize> {
        let start = floor_char_boundary(haystack, self.resume_at.min(haystack.len()));
        match haystack[start..].find(self.needle) {
            Some(offset) => Some(start + offset),
            None => {
                self.resume_at = self.overlap_start(haystack);
                None
            }
        }
    }

    /// Adjusts the resume position after `consumed` bytes were drained from
    /// the front of the buffer.
    pub fn rebase(&mut self, consumed: usize) {
        self.resume_at = self.resume_at.saturating_sub(consumed);
    }

    pub fn reset(&mut self) {
        self.resume_at = 0;
    }

    /// Offset of the shortest suffix of `haystack` that could still be the
    /// beginning of a match once more text arrives.
    pub fn overlap_start(&self, haystack: &str) -> usize {
        let keep = self.needle.len() - 1;
        floor_char_boundary(haystack, haystack.len().saturating_sub(keep))
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
