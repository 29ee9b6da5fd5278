//! Multi-probe chunk-hash matcher.
//!
//! The neighborhood-hashing scheme of Norouzi et al.
//! (<https://arxiv.org/pdf/1307.2982.pdf>): partition each barcode's packed
//! bits into chunks, index every reference under each chunk, and probe each
//! chunk's index under precomputed XOR mismatch patterns. Any target within
//! the mismatch budget of a reference is guaranteed to share at least one
//! probed bucket with it, so only bucket members ever reach the Hamming
//! kernel.

use std::collections::HashMap;

use crate::core::hamming::hamming_distance;
use crate::core::quality::{Hit, MatchQuality, MAX_DIST, NO_MATCH};

use super::masks::MaskLayout;
use super::matcher::{BarcodeSet, Matcher, MatcherError};

/// Hash-index matcher for large reference sets with a small mismatch budget.
///
/// Fast when references are many and the budget is small; probe count grows
/// steeply with the budget. For 10x-style barcodes (16 bp, ~1M references)
/// a budget of 1 over 2 chunks works well.
#[derive(Debug, Clone)]
pub struct ChunkedMatcher {
    barcodes: BarcodeSet,
    max_mismatches: u64,
    chunk_masks: Vec<u64>,
    mismatch_masks: Vec<Vec<u64>>,
    /// One multimap per chunk: masked sequence bits -> reference indices,
    /// in insertion order.
    chunk_indexes: Vec<HashMap<u64, Vec<u32>>>,
}

impl ChunkedMatcher {
    /// Build from explicit masks.
    ///
    /// `chunk_masks[i]` selects the bits of chunk *i*; `mismatch_masks[i]`
    /// holds the XOR patterns chunk *i* is probed under. The caller is
    /// responsible for the layout covering `max_mismatches` (see
    /// [`MaskLayout::striped`] for a construction that does).
    ///
    /// # Errors
    ///
    /// Returns `MaskLengthMismatch` when the two vectors differ in length.
    pub fn new(
        chunk_masks: Vec<u64>,
        mismatch_masks: Vec<Vec<u64>>,
        max_mismatches: u64,
    ) -> Result<Self, MatcherError> {
        if chunk_masks.len() != mismatch_masks.len() {
            return Err(MatcherError::MaskLengthMismatch {
                chunks: chunk_masks.len(),
                mismatch_sets: mismatch_masks.len(),
            });
        }

        let chunk_indexes = vec![HashMap::new(); chunk_masks.len()];
        Ok(Self {
            barcodes: BarcodeSet::new(),
            max_mismatches,
            chunk_masks,
            mismatch_masks,
            chunk_indexes,
        })
    }

    /// Build from a generated [`MaskLayout`].
    #[must_use]
    pub fn from_layout(layout: MaskLayout, max_mismatches: u64) -> Self {
        // A layout always carries one mismatch set per chunk.
        let chunk_indexes = vec![HashMap::new(); layout.chunk_masks.len()];
        Self {
            barcodes: BarcodeSet::new(),
            max_mismatches,
            chunk_masks: layout.chunk_masks,
            mismatch_masks: layout.mismatch_masks,
            chunk_indexes,
        }
    }

    #[must_use]
    pub fn max_mismatches(&self) -> u64 {
        self.max_mismatches
    }
}

impl Matcher for ChunkedMatcher {
    fn barcodes(&self) -> &BarcodeSet {
        &self.barcodes
    }

    fn barcodes_mut(&mut self) -> &mut BarcodeSet {
        &mut self.barcodes
    }

    fn index_one(&mut self, seq: u64) {
        // The barcode was just appended, so its index is len - 1.
        let index = (self.barcodes.len() - 1) as u32;
        for (chunk, &mask) in self.chunk_masks.iter().enumerate() {
            self.chunk_indexes[chunk]
                .entry(seq & mask)
                .or_default()
                .push(index);
        }
    }

    fn find(&self, seq: u64, flag: u64) -> Hit {
        let mut best_match = NO_MATCH;
        let mut best_dist = MAX_DIST;
        let mut next_dist = MAX_DIST;

        for (chunk, &chunk_mask) in self.chunk_masks.iter().enumerate() {
            for &mismatch_mask in &self.mismatch_masks[chunk] {
                let key = (seq ^ mismatch_mask) & chunk_mask;
                let Some(bucket) = self.chunk_indexes[chunk].get(&key) else {
                    continue;
                };
                for &candidate in bucket {
                    let candidate = u64::from(candidate);
                    // Overlapping probes rediscover the champion; never let a
                    // recheck demote it
                    if candidate == best_match {
                        continue;
                    }
                    let dist = hamming_distance(
                        seq,
                        flag,
                        self.barcodes.sequences()[candidate as usize],
                    );
                    if dist > self.max_mismatches {
                        continue;
                    }
                    if dist == best_dist {
                        // Tie: lowest reference index wins
                        best_match = best_match.min(candidate);
                        next_dist = best_dist;
                    } else if dist < best_dist {
                        best_match = candidate;
                        next_dist = best_dist;
                        best_dist = dist;
                    } else if dist < next_dist {
                        next_dist = dist;
                    }
                }
            }
        }

        Hit {
            index: best_match,
            quality: MatchQuality {
                best: best_dist,
                next: next_dist,
            }
            .encode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packed::pack;

    fn striped(width: usize, chunks: usize, budget: u64) -> ChunkedMatcher {
        ChunkedMatcher::from_layout(MaskLayout::striped(width, chunks, budget).unwrap(), budget)
    }

    fn find(matcher: &ChunkedMatcher, query: &str) -> (u64, MatchQuality) {
        let packed = pack(query.as_bytes());
        let hit = matcher.find(packed.seq, packed.flag);
        (hit.index, MatchQuality::decode(hit.quality))
    }

    #[test]
    fn test_mask_length_mismatch_rejected() {
        let err = ChunkedMatcher::new(vec![0xff, 0xff00], vec![vec![0]], 1).unwrap_err();
        assert!(matches!(
            err,
            MatcherError::MaskLengthMismatch {
                chunks: 2,
                mismatch_sets: 1
            }
        ));
    }

    #[test]
    fn test_exact_match() {
        let mut matcher = striped(4, 2, 1);
        matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();

        let (idx, qual) = find(&matcher, "ACGT");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 0);
        // TTTT is 4 mismatches away, beyond the budget: runner-up saturates
        assert_eq!(qual.next, MAX_DIST);
    }

    #[test]
    fn test_within_budget() {
        let mut matcher = striped(4, 2, 1);
        matcher.add_sequences(&["AAAA", "TAAA"]).unwrap();

        let (idx, qual) = find(&matcher, "AAAA");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 0);
        assert_eq!(qual.next, 1);
    }

    #[test]
    fn test_outside_budget_yields_sentinel() {
        let mut matcher = striped(4, 2, 1);
        matcher.add_sequences(&["AAAA"]).unwrap();

        let (idx, qual) = find(&matcher, "TTTT");
        assert_eq!(idx, NO_MATCH);
        assert!(qual.is_no_match());
        assert_eq!(qual.next, MAX_DIST);
    }

    #[test]
    fn test_tie_break_lowest_index() {
        // Both references are distance 1 from the query; overlapping probes
        // must settle on the lower index and report next == best
        let mut matcher = striped(4, 2, 2);
        matcher.add_sequences(&["AAAA", "AAAT"]).unwrap();

        let (idx, qual) = find(&matcher, "AAAG");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 1);
        assert_eq!(qual.next, 1);
    }

    #[test]
    fn test_champion_not_demoted_by_rediscovery() {
        // An exact query reaches its reference through the zero probe of
        // every chunk. The rechecks must be skipped, not fold the champion
        // into the runner-up slot
        let mut matcher = striped(4, 2, 1);
        matcher.add_sequences(&["AAAA"]).unwrap();

        let (idx, qual) = find(&matcher, "AAAA");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 0);
        assert_eq!(qual.next, MAX_DIST);
    }

    #[test]
    fn test_query_n_counts_toward_budget() {
        let mut matcher = striped(4, 2, 1);
        matcher.add_sequences(&["ACGT"]).unwrap();

        let (idx, qual) = find(&matcher, "ACGN");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 1);
    }
}
