//! Parsers and I/O for the file formats at the matcher's boundary.
//!
//! - [`barcodes`]: reference barcode lists, bare or `label<TAB>sequence`
//! - [`fastq`]: chunked FASTQ reading and writing, plain or gzip
//!
//! Barcode *content* validation (width, ambiguous bases) is not done here:
//! the matcher rejects bad references on insert, so a barcode file parses
//! successfully even when its sequences would not form a valid set.

pub mod barcodes;
pub mod fastq;
