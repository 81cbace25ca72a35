use std::path::PathBuf;

use super::*;
use clap::Parser;
use multishot_core::output::WriteMode;

#[test]
fn global_flags_default_to_working_directory_files() {
    let cli = Cli::try_parse_from(["multishot", "run"]).expect("parse");
    assert_eq!(cli.config, PathBuf::from("config.yaml"));
    assert_eq!(cli.log_file, PathBuf::from("multishot.log"));
    assert!(!cli.quiet);
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.queries, PathBuf::from("queries"));
            assert!(args.cleaners.is_empty());
            assert!(args.output.is_none());
            assert!(args.write_mode.is_none());
        }
        Commands::Catalog(_) => panic!("expected run command"),
    }
}

#[test]
fn run_parses_repeatable_filters_and_write_mode() {
    let cli = Cli::try_parse_from([
        "multishot",
        "--quiet",
        "--config",
        "conf/vivo.yaml",
        "run",
        "--query",
        "pubs_*",
        "--cleaner",
        "clean_pubs_dupe_authorships",
        "--cleaner",
        "clean_pubs_missing_doi",
        "--uri",
        "http://ex.org/p1",
        "--output",
        "out",
        "--write-mode",
        "Truncate",
    ])
    .expect("parse");
    assert!(cli.quiet);
    assert_eq!(cli.config, PathBuf::from("conf/vivo.yaml"));
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.query_glob.as_deref(), Some("pubs_*"));
            assert_eq!(args.cleaners.len(), 2);
            assert_eq!(args.uris, vec!["http://ex.org/p1"]);
            assert_eq!(args.output, Some(PathBuf::from("out")));
            assert_eq!(args.write_mode, Some(WriteMode::Truncate));
        }
        Commands::Catalog(_) => panic!("expected run command"),
    }
}

#[test]
fn unknown_write_mode_is_rejected() {
    let parsed = Cli::try_parse_from(["multishot", "run", "--write-mode", "overwrite"]);
    assert!(parsed.is_err(), "unknown write mode must be rejected");
}

#[test]
fn catalog_parses_queries_dir() {
    let cli =
        Cli::try_parse_from(["multishot", "catalog", "--queries", "audits"]).expect("parse");
    match cli.command {
        Commands::Catalog(CatalogArgs { queries }) => {
            assert_eq!(queries, PathBuf::from("audits"));
        }
        Commands::Run(_) => panic!("expected catalog command"),
    }
}
