//! # barcode-match
//!
//! A high-throughput matcher for short DNA barcodes extracted from
//! sequencing reads.
//!
//! Barcodes of up to 32 bases are packed 2 bits per base into a single
//! 64-bit word (plus a parallel ambiguity mask), which turns Hamming
//! distance into a few bitwise operations and a popcount. Queries are
//! matched against a reference set either by exhaustive scan
//! ([`ListMatcher`]) or through a multi-probe chunked hash index
//! ([`ChunkedMatcher`]) that only examines references reachable within a
//! mismatch budget.
//!
//! A single sequencing run can hold hundreds of millions of reads, so the
//! query path is batched: a slice window is cut from every read, packed,
//! matched, and written into a two-row result array of `(index, quality)`
//! pairs. Matchers only read their state during queries, so a host can
//! drive batches from as many threads as it likes.
//!
//! ## Example
//!
//! ```rust
//! use barcode_match::{ListMatcher, MatchQuality, Matcher};
//!
//! let mut matcher = ListMatcher::new();
//! matcher.add_sequences(&["ACGT", "TTTT"]).unwrap();
//! matcher.add_labels(&["sample_1", "sample_2"]);
//!
//! // Match bases 0..4 of each read
//! let reads: Vec<&[u8]> = vec![b"ACGTGGGG", b"TTATGGGG"];
//! let result = matcher.match_all(&reads, 0, 4).unwrap();
//!
//! assert_eq!(result.indices(), &[0, 1]);
//! let quality = MatchQuality::decode(result.qualities()[1]);
//! assert_eq!(quality.best, 1); // TTAT is one mismatch from TTTT
//! assert_eq!(matcher.get_label(1), Some("sample_2"));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: packed-sequence codec, Hamming kernel, quality words
//! - [`matching`]: the [`Matcher`] contract, both matchers, mask layouts,
//!   and batch buffers
//! - [`parsing`]: barcode list files and chunked FASTQ I/O
//! - [`demux`]: multi-file, multi-barcode demultiplexing runs
//! - [`cli`]: command-line interface implementation

pub mod cli;
pub mod core;
pub mod demux;
pub mod matching;
pub mod parsing;

// Re-export commonly used types for convenience
pub use crate::core::hamming::hamming_distance;
pub use crate::core::packed::{pack, pack_window, unpack, PackedSeq, MAX_WIDTH};
pub use crate::core::quality::{Hit, MatchQuality, MAX_DIST, NO_MATCH};
pub use crate::demux::{Demultiplexer, DemuxConfig, DemuxError, DemuxSummary};
pub use crate::matching::{
    pack_batch, BarcodeSet, ChunkedMatcher, ListMatcher, MaskLayout, MatchBatch, Matcher,
    MatcherError,
};
