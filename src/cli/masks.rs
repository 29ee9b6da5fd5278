use clap::Args;

use crate::cli::OutputFormat;
use crate::matching::masks::MaskLayout;

#[derive(Args)]
pub struct MasksArgs {
    /// Barcode width in bases (1-32)
    #[arg(short, long)]
    pub width: usize,

    /// Number of chunk indexes
    #[arg(short, long, default_value = "2")]
    pub chunks: usize,

    /// Mismatch budget the layout must cover
    #[arg(short = 'm', long, default_value = "1")]
    pub max_mismatches: u64,
}

/// Execute the masks subcommand
///
/// # Errors
///
/// Returns an error when the layout parameters are invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MasksArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let layout = MaskLayout::striped(args.width, args.chunks, args.max_mismatches)?;

    match format {
        OutputFormat::Text => print_text(&layout),
        OutputFormat::Json => print_json(&layout)?,
        OutputFormat::Tsv => print_tsv(&layout),
    }

    Ok(())
}

/// Base positions selected by a chunk mask.
fn mask_positions(mask: u64) -> Vec<usize> {
    (0..32).filter(|p| mask >> (2 * p) & 3 != 0).collect()
}

fn print_text(layout: &MaskLayout) {
    for (i, &mask) in layout.chunk_masks.iter().enumerate() {
        let positions: Vec<String> = mask_positions(mask).iter().map(usize::to_string).collect();
        println!(
            "chunk {i}: bases [{}] mask {mask:#018x} probes {}",
            positions.join(", "),
            layout.mismatch_masks[i].len(),
        );
    }
    println!("{} probes per query", layout.probe_count());
}

fn print_json(layout: &MaskLayout) -> anyhow::Result<()> {
    let chunks: Vec<serde_json::Value> = layout
        .chunk_masks
        .iter()
        .enumerate()
        .map(|(i, &mask)| {
            serde_json::json!({
                "chunk": i,
                "positions": mask_positions(mask),
                "mask": format!("{mask:#x}"),
                "mismatch_masks": layout.mismatch_masks[i]
                    .iter()
                    .map(|m| format!("{m:#x}"))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "chunks": chunks,
        "probes_per_query": layout.probe_count(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(layout: &MaskLayout) {
    println!("chunk\tpositions\tmask\tprobes");
    for (i, &mask) in layout.chunk_masks.iter().enumerate() {
        let positions: Vec<String> = mask_positions(mask).iter().map(usize::to_string).collect();
        println!(
            "{i}\t{}\t{mask:#x}\t{}",
            positions.join(","),
            layout.mismatch_masks[i].len(),
        );
    }
}
