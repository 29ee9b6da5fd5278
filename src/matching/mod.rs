//! Barcode matchers and the batch match pipeline.
//!
//! This module provides the matching functionality:
//!
//! - [`matcher::Matcher`]: the matcher contract, shared reference-set state
//!   plus per-implementation indexing and lookup
//! - [`list::ListMatcher`]: exhaustive linear scan; no mismatch budget
//! - [`chunked::ChunkedMatcher`]: multi-probe hash index over barcode chunks
//! - [`masks::MaskLayout`]: chunk masks and mismatch-mask neighborhoods for
//!   the chunked matcher
//! - [`batch::MatchBatch`]: the two-row rectangular result/query buffer
//!
//! ## Choosing a matcher
//!
//! The list matcher scans every reference barcode per query and is the best
//! choice for small reference sets (tens of barcodes). The chunked matcher
//! indexes barcode chunks under precomputed mismatch masks and probes only
//! the hash buckets a query could land in, which pays off for large sets
//! (thousands to millions of barcodes) with a small mismatch budget.
//!
//! ## Example
//!
//! ```rust
//! use barcode_match::matching::list::ListMatcher;
//! use barcode_match::matching::matcher::Matcher;
//! use barcode_match::core::quality::MatchQuality;
//!
//! let mut matcher = ListMatcher::new();
//! matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();
//!
//! let reads: Vec<&[u8]> = vec![b"ACGTAAAA"];
//! let result = matcher.match_all(&reads, 0, 4).unwrap();
//! assert_eq!(result.indices()[0], 0);
//! assert_eq!(MatchQuality::decode(result.qualities()[0]).best, 0);
//! ```

pub mod batch;
pub mod chunked;
pub mod list;
pub mod masks;
pub mod matcher;

pub use self::batch::{pack_batch, MatchBatch};
pub use self::chunked::ChunkedMatcher;
pub use self::list::ListMatcher;
pub use self::masks::MaskLayout;
pub use self::matcher::{BarcodeSet, Matcher, MatcherError};
