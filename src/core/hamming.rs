//! Branchless Hamming distance over packed sequences.

/// Number of positions where the query and a reference barcode differ, or
/// where the query has an ambiguous base.
///
/// `seq`/`flag` are the packed query (see [`crate::core::packed`]); `barcode`
/// is a packed reference with no flag bits. Each mismatched base leaves at
/// least one set bit in its 2-bit group of the XOR; folding the group onto
/// its low bit and OR-ing in the ambiguity mask reduces the count to a
/// popcount. Positions past the barcode width are zero in both words and
/// contribute nothing.
#[inline]
#[must_use]
pub fn hamming_distance(seq: u64, flag: u64, barcode: u64) -> u64 {
    let diff = barcode ^ seq;
    let collapsed = (diff | (diff >> 1) | flag) & 0x5555_5555_5555_5555;
    u64::from(collapsed.count_ones())
}
