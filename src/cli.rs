use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ingest")]
#[command(about = "Validates, repairs and files project folders from an inbox", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./config.{yaml,toml,json})
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move and log every eligible folder in the source directory
    Process,
    /// Show what a run would do without touching anything
    Preview,
    /// Print configuration values
    PrintConfig,
}
