use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::demux::config::DemuxConfig;
use crate::demux::pipeline::{Demultiplexer, DemuxSummary};

#[derive(Args)]
pub struct DemuxArgs {
    /// JSON run description: read files, barcode sets, name template,
    /// filters
    pub config: PathBuf,

    /// Fragments processed per batch
    #[arg(long, default_value = "100000")]
    pub batch_size: usize,

    /// Write a per-fragment TSV of every barcode's match here
    #[arg(long)]
    pub stats: Option<PathBuf>,
}

/// Execute the demux subcommand
///
/// # Errors
///
/// Returns an error if the config is invalid, any input cannot be read, or
/// any output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: DemuxArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = DemuxConfig::load_from_file(&args.config)?;

    if verbose {
        let outputs = config.reads.iter().filter(|r| r.output.is_some()).count();
        eprintln!(
            "Demultiplexing {} read files ({outputs} with outputs), {} barcode sets, {} filters",
            config.reads.len(),
            config.barcodes.len(),
            config.filters.len(),
        );
    }

    let mut demux = Demultiplexer::new(&config)?;
    if let Some(path) = &args.stats {
        demux = demux.with_stats(Box::new(BufWriter::new(File::create(path)?)));
    }

    let summary = demux.run(args.batch_size)?;

    print_summary(&summary, format)?;
    Ok(())
}

fn print_summary(summary: &DemuxSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text_summary(summary),
        OutputFormat::Json => eprintln!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Tsv => print_tsv_summary(summary),
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)] // Percentage display
fn print_text_summary(summary: &DemuxSummary) {
    let pct = if summary.total == 0 {
        0.0
    } else {
        summary.passed as f64 / summary.total as f64 * 100.0
    };
    eprintln!(
        "\n{}/{} fragments passed filters ({pct:.1}%)",
        summary.passed, summary.total,
    );
    for tally in &summary.barcodes {
        eprintln!("   {}\t{} matched", tally.name, tally.matched);
    }
}

fn print_tsv_summary(summary: &DemuxSummary) {
    eprintln!("barcode\tmatched\ttotal\tpassed");
    for tally in &summary.barcodes {
        eprintln!(
            "{}\t{}\t{}\t{}",
            tally.name, tally.matched, summary.total, summary.passed
        );
    }
}
