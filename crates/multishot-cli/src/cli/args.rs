use std::path::PathBuf;

use clap::Args;
use multishot_core::output::WriteMode;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory holding the audit query files (`*.rq`).
    #[arg(long, default_value = "queries")]
    pub queries: PathBuf,
    /// Only run queries whose name matches this glob.
    #[arg(long = "query", value_name = "GLOB")]
    pub query_glob: Option<String>,
    /// Restrict the run to these cleaners.
    #[arg(long = "cleaner", value_name = "NAME")]
    pub cleaners: Vec<String>,
    /// Subject substituted into queries carrying a `{}` placeholder.
    #[arg(long = "uri", value_name = "URI")]
    pub uris: Vec<String>,
    /// Output root. Falls back to `output_dir` from the config, then `data_out`.
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_parser = parse_write_mode)]
    pub write_mode: Option<WriteMode>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[arg(long, default_value = "queries")]
    pub queries: PathBuf,
}

fn parse_write_mode(raw: &str) -> Result<WriteMode, String> {
    raw.parse::<WriteMode>().map_err(|err| err.to_string())
}
