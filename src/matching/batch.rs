//! Two-row rectangular batches of `u64` words.
//!
//! The same shape serves both directions of the raw interface: a query batch
//! carries packed sequence words in row 0 and flag words in row 1, a result
//! batch carries match indices in row 0 and quality words in row 1. The
//! buffer is row-major and owned by whoever holds it: the batch drivers
//! return fresh buffers rather than writing through shared state.

use crate::core::packed::{pack_window, MAX_WIDTH};

use super::matcher::MatcherError;

/// A `[2, N]` row-major array of `u64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBatch {
    columns: usize,
    data: Vec<u64>,
}

impl MatchBatch {
    /// An all-zero batch with `columns` columns.
    #[must_use]
    pub fn with_columns(columns: usize) -> Self {
        Self {
            columns,
            data: vec![0; columns * 2],
        }
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Both words of one column: `(row 0, row 1)`.
    #[must_use]
    pub fn get(&self, column: usize) -> (u64, u64) {
        (self.data[column], self.data[self.columns + column])
    }

    pub fn set(&mut self, column: usize, first: u64, second: u64) {
        self.data[column] = first;
        self.data[self.columns + column] = second;
    }

    /// Row 0 of a result batch: the match index per read.
    #[must_use]
    pub fn indices(&self) -> &[u64] {
        &self.data[..self.columns]
    }

    /// Row 1 of a result batch: the quality word per read.
    #[must_use]
    pub fn qualities(&self) -> &[u64] {
        &self.data[self.columns..]
    }

    /// The full row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.data
    }
}

pub(crate) fn validate_window(start: usize, end: usize) -> Result<(), MatcherError> {
    if end < start || end - start > MAX_WIDTH {
        return Err(MatcherError::InvalidWindow { start, end });
    }
    Ok(())
}

/// Pack the window `[start, end)` of every read into a query batch
/// (row 0 = sequence words, row 1 = flag words), ready for
/// [`Matcher::match_raw`](super::matcher::Matcher::match_raw).
///
/// # Errors
///
/// Same shape errors as [`Matcher::match_all`](super::matcher::Matcher::match_all).
pub fn pack_batch(reads: &[&[u8]], start: usize, end: usize) -> Result<MatchBatch, MatcherError> {
    validate_window(start, end)?;

    let mut out = MatchBatch::with_columns(reads.len());
    for (i, read) in reads.iter().enumerate() {
        if read.len() < end {
            return Err(MatcherError::ReadTooShort {
                index: i,
                length: read.len(),
                end,
            });
        }
        let packed = pack_window(read, start, end);
        out.set(i, packed.seq, packed.flag);
    }
    Ok(out)
}
