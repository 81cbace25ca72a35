use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;

#[cfg(test)]
mod tests;

pub use args::{CatalogArgs, RunArgs};

#[derive(Debug, Parser)]
#[command(name = "multishot")]
#[command(about = "Audit a VIVO triple store and write correction triples", version)]
pub struct Cli {
    #[arg(long, default_value = multishot_core::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Keep the console silent; the log file still receives everything.
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,

    #[arg(long, default_value = "multishot.log")]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every matched audit query and write corrections.
    Run(RunArgs),
    /// Show registered cleaners and how they pair with the query files.
    Catalog(CatalogArgs),
}
