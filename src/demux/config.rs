//! Demultiplexing run configuration.
//!
//! A run is described by a JSON document naming the synchronized FASTQ
//! files, the barcode sets matched against them, the output read-name
//! template, and the pass filters:
//!
//! ```json
//! {
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
//! }
//! ```
//!
//! Sequence names are conventionally R1, R2, I1, or I2 but any unique names
//! work. A read file without an `output` is matched against but never
//! written.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::matcher::MatcherError;
use crate::parsing::barcodes::BarcodeFileError;
use crate::parsing::fastq::FastqError;

#[derive(Error, Debug)]
pub enum DemuxError {
    #[error("failed to read demux config: {0}")]
    ReadConfig(#[from] std::io::Error),

    #[error("failed to parse demux config: {0}")]
    ParseConfig(#[from] serde_json::Error),

    #[error("no read files configured")]
    NoReads,

    #[error("duplicate read name '{name}'")]
    DuplicateRead { name: String },

    #[error("duplicate barcode name '{name}'")]
    DuplicateBarcode { name: String },

    #[error("barcode '{barcode}' references unknown read '{read}'")]
    UnknownRead { barcode: String, read: String },

    #[error("filter references unknown barcode '{barcode}'")]
    UnknownFilterBarcode { barcode: String },

    #[error("name template references unknown field '{field}'")]
    UnknownTemplateField { field: String },

    #[error("unclosed '{{' in name template")]
    UnclosedTemplateField,

    #[error("unexpected '}}' in name template")]
    UnexpectedBrace,

    #[error("barcode set error: {0}")]
    Barcodes(#[from] BarcodeFileError),

    #[error("matcher error: {0}")]
    Matcher(#[from] MatcherError),

    #[error("FASTQ error: {0}")]
    Fastq(#[from] FastqError),
}

/// One named FASTQ file in the synchronized set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFile {
    /// Sequence name (typically R1, R2, I1, or I2).
    pub name: String,

    /// Input FASTQ path, plain or `.gz`.
    pub input: PathBuf,

    /// Where passing reads of this file go; omit to match without writing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// One barcode set matched against a window of one read file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeSpec {
    /// Barcode name, used in the name template and filters.
    pub name: String,

    /// Which read file the barcode sits in.
    pub read: String,

    /// Barcode list file (bare sequences or `label<TAB>sequence`).
    pub file: PathBuf,

    /// 0-based offset of the barcode within the read.
    #[serde(default)]
    pub start: usize,

    #[serde(default)]
    pub algorithm: BarcodeAlgorithm,
}

/// Matching algorithm for one barcode set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BarcodeAlgorithm {
    /// Exhaustive scan; exact distances, no budget.
    List,
    /// Chunked hash index probed within a mismatch budget.
    Chunked {
        #[serde(default = "default_max_mismatches")]
        max_mismatches: u64,
        #[serde(default = "default_chunks")]
        chunks: usize,
    },
}

fn default_max_mismatches() -> u64 {
    1
}
fn default_chunks() -> usize {
    2
}

impl Default for BarcodeAlgorithm {
    fn default() -> Self {
        Self::List
    }
}

/// A read passes when the named barcode matched within `max_dist` and its
/// runner-up is at least `min_next_dist` away. Several filters AND together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassFilter {
    pub barcode: String,
    pub max_dist: u64,
    #[serde(default)]
    pub min_next_dist: u64,
}

/// Output read-name template, parsed from a `{field}` format string.
///
/// `literals` always has one more element than `fields`; the rendered name
/// interleaves them, starting and ending with a literal. Valid fields are
/// `read_name` (the input read's name) and any configured barcode name
/// (the label of its best match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    pub literals: Vec<String>,
    pub fields: Vec<String>,
}

impl NameTemplate {
    /// # Errors
    ///
    /// Returns `UnclosedTemplateField` or `UnexpectedBrace` on malformed
    /// patterns.
    pub fn parse(pattern: &str) -> Result<Self, DemuxError> {
        let mut literals = Vec::new();
        let mut fields = Vec::new();
        let mut current = String::new();

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    literals.push(std::mem::take(&mut current));
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(DemuxError::UnclosedTemplateField),
                        }
                    }
                    fields.push(field);
                }
                '}' => return Err(DemuxError::UnexpectedBrace),
                c => current.push(c),
            }
        }
        literals.push(current);

        Ok(Self { literals, fields })
    }
}

fn default_name_template() -> String {
    "{read_name}".to_string()
}

/// A full demultiplexing run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemuxConfig {
    /// Synchronized FASTQ files, matched record for record.
    pub reads: Vec<ReadFile>,

    /// Barcode sets and where each one sits.
    pub barcodes: Vec<BarcodeSpec>,

    /// Read-name pattern for output files.
    #[serde(default = "default_name_template")]
    pub name_template: String,

    /// Conditions a fragment must meet to be written; empty means all pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<PassFilter>,
}

impl DemuxConfig {
    /// Load a run description from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ReadConfig` if the file cannot be read or `ParseConfig` on
    /// invalid JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, DemuxError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a run description from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ParseConfig` on invalid JSON.
    pub fn from_json(json: &str) -> Result<Self, DemuxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check cross-references and parse the name template.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency: empty read set, duplicate names,
    /// a barcode or filter naming something that does not exist, or a
    /// template field that is neither `read_name` nor a barcode name.
    pub fn validate(&self) -> Result<NameTemplate, DemuxError> {
        if self.reads.is_empty() {
            return Err(DemuxError::NoReads);
        }

        let mut read_names = HashSet::new();
        for read in &self.reads {
            if !read_names.insert(read.name.as_str()) {
                return Err(DemuxError::DuplicateRead {
                    name: read.name.clone(),
                });
            }
        }

        let mut barcode_names = HashSet::new();
        for barcode in &self.barcodes {
            if !barcode_names.insert(barcode.name.as_str()) {
                return Err(DemuxError::DuplicateBarcode {
                    name: barcode.name.clone(),
                });
            }
            if !read_names.contains(barcode.read.as_str()) {
                return Err(DemuxError::UnknownRead {
                    barcode: barcode.name.clone(),
                    read: barcode.read.clone(),
                });
            }
        }

        for filter in &self.filters {
            if !barcode_names.contains(filter.barcode.as_str()) {
                return Err(DemuxError::UnknownFilterBarcode {
                    barcode: filter.barcode.clone(),
                });
            }
        }

        let template = NameTemplate::parse(&self.name_template)?;
        for field in &template.fields {
            if field != "read_name" && !barcode_names.contains(field.as_str()) {
                return Err(DemuxError::UnknownTemplateField {
                    field: field.clone(),
                });
            }
        }

        Ok(template)
    }
}
