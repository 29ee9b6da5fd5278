//! Shared matcher state and the matcher contract.

use thiserror::Error;

use crate::core::packed::{pack, pack_window, unpack, PackedSeq, MAX_WIDTH};
use crate::core::quality::Hit;

use super::batch::{validate_window, MatchBatch};

#[derive(Error, Debug)]
pub enum MatcherError {
    /// Invalid reference: ambiguous bases are rejected on insert.
    #[error("reference barcode '{sequence}' contains ambiguous bases")]
    ReferenceHasN { sequence: String },

    /// Invalid reference: all barcodes in a set share one width.
    #[error("reference barcode '{sequence}' has length {found}, expected {expected}")]
    ReferenceWidth {
        sequence: String,
        expected: usize,
        found: usize,
    },

    /// Invalid reference: a barcode must fit in one packed word.
    #[error("reference barcode '{sequence}' has length {found}, maximum is {MAX_WIDTH}")]
    ReferenceTooLong { sequence: String, found: usize },

    /// Shape error: the slice window must be a valid barcode span.
    #[error("window {start}..{end} is not a valid barcode window")]
    InvalidWindow { start: usize, end: usize },

    /// Shape error: every read must reach the end of the window.
    #[error("read {index} has length {length}, shorter than window end {end}")]
    ReadTooShort {
        index: usize,
        length: usize,
        end: usize,
    },

    /// Shape error: raw query and output batches must have equal columns.
    #[error("query batch has {queries} columns but output batch has {output}")]
    ColumnMismatch { queries: usize, output: usize },

    /// Config error: one mismatch-mask set per chunk mask.
    #[error("{chunks} chunk masks but {mismatch_sets} mismatch-mask sets")]
    MaskLengthMismatch {
        chunks: usize,
        mismatch_sets: usize,
    },

    /// Config error: a striped layout needs 1..=width chunks of <=32 bases.
    #[error("cannot stripe a width-{width} barcode into {chunks} chunks")]
    InvalidLayout { width: usize, chunks: usize },
}

/// An ordered set of reference barcodes of a single width, with optional
/// parallel labels.
///
/// The first insert fixes the width; later inserts must match it. Barcodes
/// containing ambiguous bases are rejected, since references must be exact.
/// Barcodes are append-only and never removed.
#[derive(Debug, Default, Clone)]
pub struct BarcodeSet {
    width: usize,
    sequences: Vec<u64>,
    labels: Vec<String>,
}

impl BarcodeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Barcode width, or 0 before the first insert.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Packed sequence words, in insertion order.
    #[must_use]
    pub fn sequences(&self) -> &[u64] {
        &self.sequences
    }

    /// Validate and append one barcode, returning its packed word.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceTooLong`, `ReferenceWidth`, or `ReferenceHasN` when
    /// the barcode does not fit the set.
    pub fn insert(&mut self, sequence: &str) -> Result<u64, MatcherError> {
        let bytes = sequence.as_bytes();

        if bytes.len() > MAX_WIDTH {
            return Err(MatcherError::ReferenceTooLong {
                sequence: sequence.to_string(),
                found: bytes.len(),
            });
        }
        if self.width == 0 {
            self.width = bytes.len();
        } else if bytes.len() != self.width {
            return Err(MatcherError::ReferenceWidth {
                sequence: sequence.to_string(),
                expected: self.width,
                found: bytes.len(),
            });
        }

        let packed = pack(bytes);
        if packed.has_ambiguous() {
            return Err(MatcherError::ReferenceHasN {
                sequence: sequence.to_string(),
            });
        }

        self.sequences.push(packed.seq);
        Ok(packed.seq)
    }

    /// Decode every stored barcode back to a string.
    #[must_use]
    pub fn decoded(&self) -> Vec<String> {
        self.sequences
            .iter()
            .map(|&seq| unpack(PackedSeq { seq, flag: 0 }, self.width))
            .collect()
    }

    pub fn push_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// True iff there is exactly one label per barcode.
    #[must_use]
    pub fn has_labels(&self) -> bool {
        !self.labels.is_empty() && self.labels.len() == self.sequences.len()
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label for a reference index; `None` for the no-match sentinel or any
    /// index without a label.
    #[must_use]
    pub fn label(&self, index: u64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }
}

/// The matcher contract.
///
/// Implementations supply the shared [`BarcodeSet`] plus two operations:
/// [`index_one`](Matcher::index_one), called once per inserted barcode to
/// update any acceleration structure, and [`find`](Matcher::find), the
/// single-query lookup. Everything else (validated inserts, labels, and the
/// batch drivers) is provided on top of those.
///
/// Build and query phases are separated by the borrow checker: mutation
/// takes `&mut self`, while `find`, [`match_all`](Matcher::match_all) and
/// [`match_raw`](Matcher::match_raw) take `&self` and only read. A built
/// matcher can therefore serve any number of concurrent readers; a host that
/// wants parallel batches splits its reads and calls `match_all` from each
/// worker, each call returning its own output buffer.
pub trait Matcher {
    fn barcodes(&self) -> &BarcodeSet;

    fn barcodes_mut(&mut self) -> &mut BarcodeSet;

    /// Index a barcode that was just appended to the set.
    fn index_one(&mut self, seq: u64);

    /// Match one packed query against the reference set.
    fn find(&self, seq: u64, flag: u64) -> Hit;

    /// Validate, pack, append, and index each barcode in order.
    ///
    /// # Errors
    ///
    /// Fails on the first barcode with an ambiguous base or a width that
    /// differs from the set's; earlier barcodes in the slice stay inserted.
    fn add_sequences(&mut self, sequences: &[&str]) -> Result<(), MatcherError> {
        for sequence in sequences {
            let seq = self.barcodes_mut().insert(sequence)?;
            self.index_one(seq);
        }
        Ok(())
    }

    /// Decoded reference barcodes, in insertion order.
    fn get_sequences(&self) -> Vec<String> {
        self.barcodes().decoded()
    }

    fn add_label(&mut self, label: &str) {
        self.barcodes_mut().push_label(label);
    }

    fn add_labels(&mut self, labels: &[&str]) {
        for label in labels {
            self.add_label(label);
        }
    }

    fn has_labels(&self) -> bool {
        self.barcodes().has_labels()
    }

    fn get_label(&self, index: u64) -> Option<&str> {
        self.barcodes().label(index)
    }

    fn get_labels(&self, indexes: &[u64]) -> Vec<Option<&str>> {
        indexes.iter().map(|&i| self.get_label(i)).collect()
    }

    /// Match the window `[start, end)` of every read.
    ///
    /// Column *i* of the returned batch holds the match index (row 0) and
    /// quality word (row 1) for read *i*. With an empty reference set every
    /// column is the sentinel hit; that is a result, not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` if `end < start` or the window is wider than
    /// 32 bases, or `ReadTooShort` if any read ends before `end`.
    fn match_all(
        &self,
        reads: &[&[u8]],
        start: usize,
        end: usize,
    ) -> Result<MatchBatch, MatcherError> {
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
            let hit = self.find(packed.seq, packed.flag);
            out.set(i, hit.index, hit.quality);
        }
        Ok(out)
    }

    /// Match pre-packed queries, skipping the codec.
    ///
    /// `queries` carries packed words in row 0 and flag words in row 1; the
    /// result layout matches [`match_all`](Matcher::match_all). Exists for
    /// benchmarking the lookup in isolation.
    ///
    /// # Errors
    ///
    /// Returns `ColumnMismatch` when the two batches disagree on width.
    fn match_raw(&self, queries: &MatchBatch, out: &mut MatchBatch) -> Result<(), MatcherError> {
        if queries.columns() != out.columns() {
            return Err(MatcherError::ColumnMismatch {
                queries: queries.columns(),
                output: out.columns(),
            });
        }

        for i in 0..queries.columns() {
            let (seq, flag) = queries.get(i);
            let hit = self.find(seq, flag);
            out.set(i, hit.index, hit.quality);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::list::ListMatcher;

    #[test]
    fn test_first_insert_fixes_width() {
        let mut set = BarcodeSet::new();
        assert_eq!(set.width(), 0);
        set.insert("ACGT").unwrap();
        assert_eq!(set.width(), 4);

        let err = set.insert("ACGTA").unwrap_err();
        assert!(matches!(
            err,
            MatcherError::ReferenceWidth {
                expected: 4,
                found: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_ambiguous_reference() {
        let mut set = BarcodeSet::new();
        let err = set.insert("ACNT").unwrap_err();
        assert!(matches!(err, MatcherError::ReferenceHasN { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_rejects_over_long_reference() {
        let mut set = BarcodeSet::new();
        let long = "A".repeat(33);
        let err = set.insert(&long).unwrap_err();
        assert!(matches!(err, MatcherError::ReferenceTooLong { found: 33, .. }));
    }

    #[test]
    fn test_decoded_round_trip() {
        let mut set = BarcodeSet::new();
        set.insert("ACGT").unwrap();
        set.insert("TTGA").unwrap();
        assert_eq!(set.decoded(), vec!["ACGT".to_string(), "TTGA".to_string()]);
    }

    #[test]
    fn test_labels() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();
        assert!(!matcher.has_labels());

        matcher.add_labels(&["alpha", "beta"]);
        assert!(matcher.has_labels());
        assert_eq!(matcher.get_label(0), Some("alpha"));
        assert_eq!(matcher.get_label(1), Some("beta"));
        assert_eq!(matcher.get_label(2), None);
        assert_eq!(matcher.get_label(u64::MAX), None);
        assert_eq!(
            matcher.get_labels(&[1, 0]),
            vec![Some("beta"), Some("alpha")]
        );
    }

    #[test]
    fn test_label_count_must_match() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();
        matcher.add_label("only-one");
        assert!(!matcher.has_labels());
    }

    #[test]
    fn test_match_all_window_errors() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT"]).unwrap();

        let reads: Vec<&[u8]> = vec![b"ACGTACGT"];
        assert!(matches!(
            matcher.match_all(&reads, 4, 2),
            Err(MatcherError::InvalidWindow { start: 4, end: 2 })
        ));
        assert!(matches!(
            matcher.match_all(&reads, 0, 33),
            Err(MatcherError::InvalidWindow { .. })
        ));

        let short: Vec<&[u8]> = vec![b"ACGTACGT", b"AC"];
        assert!(matches!(
            matcher.match_all(&short, 0, 4),
            Err(MatcherError::ReadTooShort { index: 1, length: 2, end: 4 })
        ));
    }

    #[test]
    fn test_match_raw_column_mismatch() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT"]).unwrap();

        let queries = MatchBatch::with_columns(3);
        let mut out = MatchBatch::with_columns(2);
        assert!(matches!(
            matcher.match_raw(&queries, &mut out),
            Err(MatcherError::ColumnMismatch {
                queries: 3,
                output: 2
            })
        ));
    }
}
