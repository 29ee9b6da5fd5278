//! The demultiplexing pipeline: synchronized reads in, filtered reads out.

use std::io::Write;

use serde::Serialize;

use crate::core::quality::{Hit, MatchQuality};
use crate::matching::chunked::ChunkedMatcher;
use crate::matching::list::ListMatcher;
use crate::matching::masks::MaskLayout;
use crate::matching::matcher::{Matcher, MatcherError};
use crate::parsing::barcodes::read_barcodes;
use crate::parsing::fastq::{FastqRecord, FastqSet, FastqWriter};

use super::config::{BarcodeAlgorithm, DemuxConfig, DemuxError, NameTemplate};

/// Placeholder label for fragments whose barcode found nothing in budget.
const UNMATCHED_LABEL: &str = "*";

/// One barcode set bound to its read file and window.
struct BoundBarcode {
    name: String,
    read_index: usize,
    start: usize,
    end: usize,
    matcher: Box<dyn Matcher>,
    /// File labels, or the barcode sequences themselves for bare lists.
    labels: Vec<String>,
}

impl BoundBarcode {
    fn label_for(&self, hit: Hit) -> &str {
        if MatchQuality::decode(hit.quality).is_no_match() {
            UNMATCHED_LABEL
        } else {
            &self.labels[hit.index as usize]
        }
    }
}

/// A name-template field resolved against the configured barcodes.
enum BoundField {
    ReadName,
    Barcode(usize),
}

/// A pass filter resolved against the configured barcodes.
struct BoundFilter {
    barcode: usize,
    max_dist: u64,
    min_next_dist: u64,
}

/// Tallies for one demultiplexing run.
#[derive(Debug, Clone, Serialize)]
pub struct DemuxSummary {
    /// Fragments (synchronized record columns) processed.
    pub total: usize,
    /// Fragments that passed every filter.
    pub passed: usize,
    pub barcodes: Vec<BarcodeTally>,
}

/// Match count for one barcode set over the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct BarcodeTally {
    pub name: String,
    pub matched: u64,
}

/// Drives a whole demultiplexing run.
///
/// Built from a validated [`DemuxConfig`]: every input FASTQ is opened into
/// one synchronized set, every barcode list is loaded into its own matcher,
/// and output writers are created for the read files that want them. Each
/// chunk is read from all files at once, every barcode set is matched
/// against its file and window, and the fragments passing all filters are
/// written out with template-rendered names.
pub struct Demultiplexer {
    inputs: FastqSet,
    writers: Vec<Option<FastqWriter>>,
    barcodes: Vec<BoundBarcode>,
    template: NameTemplate,
    template_fields: Vec<BoundField>,
    filters: Vec<BoundFilter>,
    stats: Option<Box<dyn Write>>,
}

impl Demultiplexer {
    /// Validate the config, open every file, and build every matcher.
    ///
    /// # Errors
    ///
    /// Returns any [`DemuxConfig::validate`] error, a barcode file or
    /// matcher construction error, or an IO error opening inputs/outputs.
    pub fn new(config: &DemuxConfig) -> Result<Self, DemuxError> {
        let template = config.validate()?;

        let input_paths: Vec<_> = config.reads.iter().map(|r| r.input.as_path()).collect();
        let inputs = FastqSet::open(&input_paths)?;

        let mut writers = Vec::with_capacity(config.reads.len());
        for read in &config.reads {
            writers.push(match &read.output {
                Some(path) => Some(FastqWriter::create(path)?),
                None => None,
            });
        }

        let mut barcodes = Vec::with_capacity(config.barcodes.len());
        for spec in &config.barcodes {
            // validate() guarantees the read name resolves
            let read_index = config
                .reads
                .iter()
                .position(|r| r.name == spec.read)
                .ok_or_else(|| DemuxError::UnknownRead {
                    barcode: spec.name.clone(),
                    read: spec.read.clone(),
                })?;

            let barcode_file = read_barcodes(&spec.file)?;
            let width = barcode_file.sequences[0].len();

            let mut matcher: Box<dyn Matcher> = match spec.algorithm {
                BarcodeAlgorithm::List => Box::new(ListMatcher::new()),
                BarcodeAlgorithm::Chunked {
                    max_mismatches,
                    chunks,
                } => {
                    let layout = MaskLayout::striped(width, chunks, max_mismatches)?;
                    Box::new(ChunkedMatcher::from_layout(layout, max_mismatches))
                }
            };
            let sequences: Vec<&str> = barcode_file.sequences.iter().map(String::as_str).collect();
            matcher.add_sequences(&sequences)?;
            if let Some(labels) = &barcode_file.labels {
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                matcher.add_labels(&labels);
            }

            let labels = match barcode_file.labels {
                Some(labels) => labels,
                None => matcher.get_sequences(),
            };

            barcodes.push(BoundBarcode {
                name: spec.name.clone(),
                read_index,
                start: spec.start,
                end: spec.start + width,
                matcher,
                labels,
            });
        }

        let template_fields = template
            .fields
            .iter()
            .map(|field| {
                if field == "read_name" {
                    BoundField::ReadName
                } else {
                    // validate() guarantees every other field is a barcode
                    let index = barcodes
                        .iter()
                        .position(|b| &b.name == field)
                        .unwrap_or_default();
                    BoundField::Barcode(index)
                }
            })
            .collect();

        let filters = config
            .filters
            .iter()
            .map(|filter| BoundFilter {
                barcode: barcodes
                    .iter()
                    .position(|b| b.name == filter.barcode)
                    .unwrap_or_default(),
                max_dist: filter.max_dist,
                min_next_dist: filter.min_next_dist,
            })
            .collect();

        Ok(Self {
            inputs,
            writers,
            barcodes,
            template,
            template_fields,
            filters,
            stats: None,
        })
    }

    /// Also write a per-fragment TSV of every barcode's match to `writer`.
    #[must_use]
    pub fn with_stats(mut self, writer: Box<dyn Write>) -> Self {
        self.stats = Some(writer);
        self
    }

    /// Run the pipeline to completion, consuming the demultiplexer so
    /// output files are flushed and finished.
    ///
    /// # Errors
    ///
    /// Returns the first read, match, or write error; partial outputs are
    /// left behind.
    pub fn run(mut self, batch_size: usize) -> Result<DemuxSummary, DemuxError> {
        let mut summary = DemuxSummary {
            total: 0,
            passed: 0,
            barcodes: self
                .barcodes
                .iter()
                .map(|b| BarcodeTally {
                    name: b.name.clone(),
                    matched: 0,
                })
                .collect(),
        };

        if let Some(stats) = self.stats.as_mut() {
            write_stats_header(stats, &self.barcodes)?;
        }

        loop {
            let chunks = self.inputs.read_chunk(batch_size)?;
            let count = chunks.first().map_or(0, Vec::len);
            if count == 0 {
                break;
            }

            // One hit list per barcode set, all aligned with the chunk
            let mut all_hits = Vec::with_capacity(self.barcodes.len());
            for barcode in &self.barcodes {
                let hits =
                    match_chunk(&*barcode.matcher, &chunks[barcode.read_index], barcode.start, barcode.end)?;
                all_hits.push(hits);
            }

            for (tally, hits) in summary.barcodes.iter_mut().zip(&all_hits) {
                tally.matched += hits
                    .iter()
                    .filter(|hit| !MatchQuality::decode(hit.quality).is_no_match())
                    .count() as u64;
            }

            for i in 0..count {
                let pass = self.filters.iter().all(|filter| {
                    let qual = MatchQuality::decode(all_hits[filter.barcode][i].quality);
                    qual.best <= filter.max_dist && qual.next >= filter.min_next_dist
                });

                if let Some(stats) = self.stats.as_mut() {
                    write_stats_row(stats, &self.barcodes, &all_hits, &chunks, i, pass)?;
                }

                if !pass {
                    continue;
                }
                summary.passed += 1;

                for (read_index, writer) in self.writers.iter_mut().enumerate() {
                    let Some(writer) = writer else {
                        continue;
                    };
                    let record = &chunks[read_index][i];
                    let name = render_name(
                        &self.template,
                        &self.template_fields,
                        &self.barcodes,
                        &all_hits,
                        record,
                        i,
                    );
                    writer.write_record(&FastqRecord {
                        name,
                        sequence: record.sequence.clone(),
                        quality: record.quality.clone(),
                    })?;
                }
            }
            summary.total += count;
        }

        if let Some(mut stats) = self.stats.take() {
            stats.flush().map_err(crate::parsing::fastq::FastqError::Io)?;
        }
        for writer in self.writers.into_iter().flatten() {
            writer.finish()?;
        }

        Ok(summary)
    }
}

/// Match one barcode set against its chunk, tolerating short reads: a
/// fragment that ends before the window gets the sentinel hit instead of
/// failing the batch.
fn match_chunk(
    matcher: &dyn Matcher,
    records: &[FastqRecord],
    start: usize,
    end: usize,
) -> Result<Vec<Hit>, MatcherError> {
    let mut hits = vec![Hit::none(); records.len()];
    let mut kept = Vec::with_capacity(records.len());
    let mut reads: Vec<&[u8]> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if record.sequence.len() >= end {
            kept.push(i);
            reads.push(record.sequence.as_slice());
        }
    }

    let result = matcher.match_all(&reads, start, end)?;
    for (j, &i) in kept.iter().enumerate() {
        let (index, quality) = result.get(j);
        hits[i] = Hit { index, quality };
    }
    Ok(hits)
}

fn render_name(
    template: &NameTemplate,
    fields: &[BoundField],
    barcodes: &[BoundBarcode],
    all_hits: &[Vec<Hit>],
    record: &FastqRecord,
    column: usize,
) -> Vec<u8> {
    let mut name = Vec::with_capacity(record.name.len());
    for (literal, field) in template.literals.iter().zip(fields) {
        name.extend_from_slice(literal.as_bytes());
        match field {
            BoundField::ReadName => name.extend_from_slice(&record.name),
            BoundField::Barcode(index) => {
                let label = barcodes[*index].label_for(all_hits[*index][column]);
                name.extend_from_slice(label.as_bytes());
            }
        }
    }
    if let Some(last) = template.literals.last() {
        name.extend_from_slice(last.as_bytes());
    }
    name
}

fn write_stats_header(
    out: &mut Box<dyn Write>,
    barcodes: &[BoundBarcode],
) -> Result<(), DemuxError> {
    let mut header = String::from("read");
    for barcode in barcodes {
        header.push_str(&format!(
            "\t{name}_label\t{name}_dist\t{name}_next_dist",
            name = barcode.name
        ));
    }
    header.push_str("\tpass");
    writeln!(out, "{header}").map_err(crate::parsing::fastq::FastqError::Io)?;
    Ok(())
}

fn write_stats_row(
    out: &mut Box<dyn Write>,
    barcodes: &[BoundBarcode],
    all_hits: &[Vec<Hit>],
    chunks: &[Vec<FastqRecord>],
    column: usize,
    pass: bool,
) -> Result<(), DemuxError> {
    let name = String::from_utf8_lossy(&chunks[0][column].name);
    let mut row = name.into_owned();
    for (barcode, hits) in barcodes.iter().zip(all_hits) {
        let hit = hits[column];
        let qual = MatchQuality::decode(hit.quality);
        row.push_str(&format!(
            "\t{}\t{}\t{}",
            barcode.label_for(hit),
            qual.best,
            qual.next
        ));
    }
    row.push_str(if pass { "\tpass" } else { "\tfail" });
    writeln!(out, "{row}").map_err(crate::parsing::fastq::FastqError::Io)?;
    Ok(())
}
