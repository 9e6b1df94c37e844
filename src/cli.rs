use clap::{Parser, Subcommand, ValueEnum};
use genfetch::storage::OutputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "genfetch")]
#[command(about = "Fetch daily wind and solar generation data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, normalize and write one or all sources
    Run(RunArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Wind,
    Solar,
    All,
}

impl SourceArg {
    /// Registry name for a single source, `None` for all
    pub fn name(self) -> Option<&'static str> {
        match self {
            SourceArg::Wind => Some(genfetch::sources::WIND),
            SourceArg::Solar => Some(genfetch::sources::SOLAR),
            SourceArg::All => None,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Source to fetch
    #[arg(long, value_enum)]
    pub source: SourceArg,

    /// Output file format (defaults to output.format)
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Output directory (defaults to output.path)
    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// Skip the combined output when running all sources
    #[arg(long)]
    pub no_combine: bool,

    /// First day to fetch, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day to fetch, YYYY-MM-DD (defaults to yesterday)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Days before the end date to cover when no start date is given
    #[arg(long)]
    pub lookback_days: Option<u32>,
}
