use clap::Parser;
use tracing_subscriber::EnvFilter;

use barcode_match::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("barcode_match=debug,info")
    } else {
        EnvFilter::new("barcode_match=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Assign(args) => {
            cli::assign::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Demux(args) => {
            cli::demux::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Masks(args) => {
            cli::masks::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
