use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "garnet",
    version,
    about = "Static semantic analysis for Ruby",
    long_about = "Builds a definition graph from Ruby sources and reports undefined names, \
                  argument mismatches, and unused or shadowed variables."
)]
pub struct GarnetCli {
    #[command(subcommand)]
    pub command: Commands,
}

impl GarnetCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze Ruby files or directories
    Check {
        /// Files or directories to analyze
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Number of worker threads (0 means one per CPU core)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Configuration file (defaults to garnet.toml in the current directory)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the lowered syntax tree of one file
    DumpAst {
        /// Ruby file to parse
        file: PathBuf,
    },
    /// List the available analyses
    Analyses,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
