use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lethe")]
#[command(about = "Self-expiring message retention daemon", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the retention scheduler (backfill, tick loop, stats server)
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Path to a TOML configuration file (overrides LETHE_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
