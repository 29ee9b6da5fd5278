use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::core::quality::{Hit, MatchQuality};
use crate::matching::chunked::ChunkedMatcher;
use crate::matching::list::ListMatcher;
use crate::matching::masks::MaskLayout;
use crate::matching::matcher::Matcher;
use crate::parsing::barcodes::read_barcodes;
use crate::parsing::fastq::{FastqChunkReader, FastqWriter};

#[derive(Args)]
pub struct AssignArgs {
    /// Input FASTQ file (.fastq or .fastq.gz)
    pub fastq: PathBuf,

    /// Barcode list: bare sequences or label<TAB>sequence lines
    pub barcodes: PathBuf,

    /// 0-based offset of the barcode within each read
    #[arg(short, long, default_value = "0")]
    pub start: usize,

    /// Matching algorithm
    #[arg(short, long, value_enum, default_value = "chunked")]
    pub algorithm: Algorithm,

    /// Maximum mismatches reported by the chunked matcher
    #[arg(short = 'm', long, default_value = "1")]
    pub max_mismatches: u64,

    /// Number of chunk indexes for the chunked matcher
    #[arg(long, default_value = "2")]
    pub chunks: usize,

    /// Reads matched per batch
    #[arg(long, default_value = "100000")]
    pub batch_size: usize,

    /// Per-read TSV output (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write matched reads here with the barcode label appended to the name
    #[arg(long)]
    pub annotated_fastq: Option<PathBuf>,

    /// Delimiter between read name and label in --annotated-fastq
    #[arg(long, default_value = ":")]
    pub delimiter: char,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Algorithm {
    /// Exhaustive scan; exact distances, no budget, slow for large sets
    List,
    /// Chunked hash index; fast for large sets within a mismatch budget
    Chunked,
}

/// Running tallies over all batches.
struct Summary {
    total: usize,
    matched: usize,
    unmatched: usize,
    too_short: usize,
    per_barcode: Vec<u64>,
}

impl Summary {
    fn new(barcode_count: usize) -> Self {
        Self {
            total: 0,
            matched: 0,
            unmatched: 0,
            too_short: 0,
            per_barcode: vec![0; barcode_count],
        }
    }
}

/// Execute the assign subcommand
///
/// # Errors
///
/// Returns an error if any input cannot be read, the barcode set is
/// invalid, or output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AssignArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let barcode_file = read_barcodes(&args.barcodes)?;
    let width = barcode_file.sequences[0].len();
    let end = args.start + width;

    let mut matcher: Box<dyn Matcher> = match args.algorithm {
        Algorithm::List => Box::new(ListMatcher::new()),
        Algorithm::Chunked => {
            let layout = MaskLayout::striped(width, args.chunks, args.max_mismatches)?;
            if verbose {
                eprintln!(
                    "Chunked layout: {} chunks, {} probes per query",
                    layout.len(),
                    layout.probe_count()
                );
            }
            Box::new(ChunkedMatcher::from_layout(layout, args.max_mismatches))
        }
    };

    let sequences: Vec<&str> = barcode_file.sequences.iter().map(String::as_str).collect();
    matcher.add_sequences(&sequences)?;
    if let Some(labels) = &barcode_file.labels {
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        matcher.add_labels(&labels);
    }

    if verbose {
        eprintln!(
            "Loaded {} width-{width} barcodes from {} (window {}..{end})",
            matcher.barcodes().len(),
            args.barcodes.display(),
            args.start,
        );
    }

    // Unlabeled sets report the barcode sequence itself
    let display_labels: Vec<String> = match &barcode_file.labels {
        Some(labels) => labels.clone(),
        None => matcher.get_sequences(),
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    writeln!(out, "read\tbarcode_index\tlabel\tbest_dist\tnext_dist")?;

    let mut annotated = match &args.annotated_fastq {
        Some(path) => Some(FastqWriter::create(path)?),
        None => None,
    };

    let mut reader = FastqChunkReader::open(&args.fastq)?;
    let mut summary = Summary::new(matcher.barcodes().len());

    loop {
        let records = reader.read_chunk(args.batch_size)?;
        if records.is_empty() {
            break;
        }

        // Reads that end before the window get a sentinel row instead of
        // failing the whole batch
        let mut rows = vec![Hit::none(); records.len()];
        let mut kept = Vec::with_capacity(records.len());
        let mut reads: Vec<&[u8]> = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if record.sequence.len() >= end {
                kept.push(i);
                reads.push(record.sequence.as_slice());
            } else {
                summary.too_short += 1;
            }
        }

        let result = matcher.match_all(&reads, args.start, end)?;
        for (j, &i) in kept.iter().enumerate() {
            let (index, quality) = result.get(j);
            rows[i] = Hit { index, quality };
        }

        for (record, hit) in records.iter().zip(&rows) {
            let qual = MatchQuality::decode(hit.quality);
            let name = String::from_utf8_lossy(&record.name);

            if qual.is_no_match() {
                summary.unmatched += 1;
                writeln!(out, "{name}\t*\t*\t{}\t{}", qual.best, qual.next)?;
                continue;
            }

            let label = &display_labels[hit.index as usize];
            summary.matched += 1;
            summary.per_barcode[hit.index as usize] += 1;
            writeln!(out, "{name}\t{}\t{label}\t{}\t{}", hit.index, qual.best, qual.next)?;

            if let Some(writer) = annotated.as_mut() {
                writer.write_record(&record.annotated(label, args.delimiter))?;
            }
        }
        summary.total += records.len();
    }

    out.flush()?;
    if let Some(writer) = annotated {
        writer.finish()?;
    }

    if summary.too_short > 0 {
        warn!(
            count = summary.too_short,
            end, "reads shorter than the barcode window were left unmatched"
        );
    }

    print_summary(&summary, &display_labels, format)?;
    Ok(())
}

fn print_summary(summary: &Summary, labels: &[String], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text_summary(summary, labels),
        OutputFormat::Json => print_json_summary(summary, labels)?,
        OutputFormat::Tsv => print_tsv_summary(summary, labels),
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)] // Percentage display
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn print_text_summary(summary: &Summary, labels: &[String]) {
    eprintln!(
        "\nAssigned {}/{} reads ({:.1}%), {} unmatched",
        summary.matched,
        summary.total,
        percent(summary.matched, summary.total),
        summary.unmatched,
    );
    if summary.too_short > 0 {
        eprintln!("   {} reads were shorter than the barcode window", summary.too_short);
    }
    for (i, count) in summary.per_barcode.iter().enumerate() {
        eprintln!("   {i}\t{}\t{count}", labels[i]);
    }
}

#[derive(serde::Serialize)]
struct SummaryReport<'a> {
    total: usize,
    matched: usize,
    unmatched: usize,
    too_short: usize,
    per_barcode: Vec<BarcodeCount<'a>>,
}

#[derive(serde::Serialize)]
struct BarcodeCount<'a> {
    index: usize,
    label: &'a str,
    count: u64,
}

fn print_json_summary(summary: &Summary, labels: &[String]) -> anyhow::Result<()> {
    let report = SummaryReport {
        total: summary.total,
        matched: summary.matched,
        unmatched: summary.unmatched,
        too_short: summary.too_short,
        per_barcode: summary
            .per_barcode
            .iter()
            .enumerate()
            .map(|(index, &count)| BarcodeCount {
                index,
                label: &labels[index],
                count,
            })
            .collect(),
    };

    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_tsv_summary(summary: &Summary, labels: &[String]) {
    eprintln!("barcode_index\tlabel\tcount");
    for (i, count) in summary.per_barcode.iter().enumerate() {
        eprintln!("{i}\t{}\t{count}", labels[i]);
    }
    eprintln!("*\tunmatched\t{}", summary.unmatched);
}
