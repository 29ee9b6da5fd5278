//! Exhaustive linear-scan matcher.

use crate::core::hamming::hamming_distance;
use crate::core::quality::{Hit, MatchQuality, MAX_DIST, NO_MATCH};

use super::matcher::{BarcodeSet, Matcher};

/// Scans every reference barcode per query.
///
/// No acceleration structure and no mismatch budget: the best and
/// second-best distances are exact whatever their magnitude. Per-query cost
/// is linear in the reference count, so this is the right matcher for small
/// sets (as a rule of thumb, under ~100 barcodes) and the ground truth the
/// chunked matcher is tested against.
#[derive(Debug, Default, Clone)]
pub struct ListMatcher {
    barcodes: BarcodeSet,
}

impl ListMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Matcher for ListMatcher {
    fn barcodes(&self) -> &BarcodeSet {
        &self.barcodes
    }

    fn barcodes_mut(&mut self) -> &mut BarcodeSet {
        &mut self.barcodes
    }

    fn index_one(&mut self, _seq: u64) {
        // The scan walks the barcode set directly.
    }

    fn find(&self, seq: u64, flag: u64) -> Hit {
        let mut best_match = NO_MATCH;
        let mut best_dist = MAX_DIST;
        let mut next_dist = MAX_DIST;

        for (i, &barcode) in self.barcodes.sequences().iter().enumerate() {
            let dist = hamming_distance(seq, flag, barcode);
            if dist < best_dist {
                best_match = i as u64;
                next_dist = best_dist;
                best_dist = dist;
            } else if dist < next_dist {
                next_dist = dist;
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

    fn find(matcher: &ListMatcher, query: &str) -> (u64, MatchQuality) {
        let packed = pack(query.as_bytes());
        let hit = matcher.find(packed.seq, packed.flag);
        (hit.index, MatchQuality::decode(hit.quality))
    }

    #[test]
    fn test_exact_match() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();

        let (idx, qual) = find(&matcher, "ACGT");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 0);
        assert_eq!(qual.next, 4);
    }

    #[test]
    fn test_single_mismatch_and_tie() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["AAAA", "TAAA"]).unwrap();

        let (idx, qual) = find(&matcher, "AAAA");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 0);
        assert_eq!(qual.next, 1);

        // Equidistant from both references: lowest index wins, and the
        // runner-up distance equals the best
        let (idx, qual) = find(&matcher, "AAAT");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 1);
        assert_eq!(qual.next, 2);
    }

    #[test]
    fn test_tie_reports_equal_distances() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["AAAA", "AAAT"]).unwrap();

        let (idx, qual) = find(&matcher, "AAAG");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 1);
        assert_eq!(qual.next, 1);
    }

    #[test]
    fn test_query_n_counts() {
        let mut matcher = ListMatcher::new();
        matcher.add_sequences(&["ACGT"]).unwrap();

        let (idx, qual) = find(&matcher, "ACGN");
        assert_eq!(idx, 0);
        assert_eq!(qual.best, 1);
    }

    #[test]
    fn test_empty_set_yields_sentinel() {
        let matcher = ListMatcher::new();
        let (idx, qual) = find(&matcher, "ACGT");
        assert_eq!(idx, NO_MATCH);
        assert!(qual.is_no_match());
        assert_eq!(qual.next, MAX_DIST);
    }
}
