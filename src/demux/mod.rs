//! Multi-file, multi-barcode demultiplexing.
//!
//! Paired sequencing output arrives as several synchronized FASTQ files
//! (R1/R2/I1/I2) whose records line up fragment for fragment, and a single
//! fragment can carry several independent barcodes: a sample index in I1, a
//! cell barcode at the start of R1, a feature barcode inside R2. This
//! module orchestrates a whole run over that shape:
//!
//! - [`config::DemuxConfig`]: JSON run description naming the read files,
//!   the barcode sets with their file/window bindings, the output name
//!   template, and the pass filters
//! - [`pipeline::Demultiplexer`]: reads all files in lockstep, matches
//!   every barcode set against its read, and writes the fragments that
//!   pass every filter with matched labels rendered into the read names
//!
//! ## Example
//!
//! ```rust,no_run
//! use barcode_match::demux::config::DemuxConfig;
//! use barcode_match::demux::pipeline::Demultiplexer;
//!
//! let config = DemuxConfig::from_json(r#"{
//!   "reads": [
//!     {"name": "R1", "input": "R1.fastq.gz", "output": "R1_out.fastq.gz"},
//!     {"name": "I1", "input": "I1.fastq.gz"}
//!   ],
//!   "barcodes": [
//!     {"name": "sample", "read": "I1", "file": "samples.tsv"},
//!     {"name": "cell", "read": "R1", "file": "cells.txt",
//!      "algorithm": {"kind": "chunked", "max_mismatches": 1, "chunks": 2}}
//!   ],
//!   "name_template": "{read_name}:{sample}:{cell}",
//!   "filters": [{"barcode": "sample", "max_dist": 1, "min_next_dist": 2}]
//! }"#).unwrap();
//!
//! let summary = Demultiplexer::new(&config).unwrap().run(100_000).unwrap();
//! println!("{}/{} fragments passed", summary.passed, summary.total);
//! ```

pub mod config;
pub mod pipeline;

pub use self::config::{BarcodeAlgorithm, BarcodeSpec, DemuxConfig, DemuxError, PassFilter, ReadFile};
pub use self::pipeline::{BarcodeTally, Demultiplexer, DemuxSummary};
