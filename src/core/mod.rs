//! Core data types for barcode matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`packed::PackedSeq`]: a DNA sequence of up to 32 bases packed into two
//!   64-bit words (2-bit bases plus an ambiguity mask)
//! - [`hamming::hamming_distance`]: bitwise Hamming distance over packed
//!   sequences
//! - [`quality::MatchQuality`] and [`quality::Hit`]: best and second-best
//!   match distances packed into a single quality word
//!
//! ## Packed Layout
//!
//! Base *i* of a sequence occupies bits `[2i, 2i+2)` of the sequence word,
//! lowest-indexed base in the least significant pair:
//!
//! | Base | Code |
//! |------|------|
//! | A    | 00   |
//! | C    | 01   |
//! | G    | 10   |
//! | T    | 11   |
//!
//! Any byte outside `{A, C, G, T}` sets bit `2i` of the flag word, marking
//! the position as ambiguous (N). Bits at positions `>= 2k` are zero in both
//! words. This layout is the wire-level contract shared by the codec, the
//! matchers, precomputed chunk masks, and batch results.

pub mod hamming;
pub mod packed;
pub mod quality;
