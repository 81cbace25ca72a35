use std::collections::BTreeMap;

use anyhow::{Context, Result};
use multishot_core::catalog::{AuditQuery, CatalogFilter};
use multishot_core::matcher::MatchReport;
use multishot_core::registry::CleanerInfo;
use multishot_core::{
    AuditPlan, AuditRunner, CleanerRegistry, MultiShotConfig, MultiShotError, RunContext,
    RunOptions, SparqlClient, builtin_registry,
};
use serde::Serialize;

use crate::cli::{Commands, RunArgs};

mod support;


use self::support::print_json;

/// What `multishot catalog` prints.
#[derive(Debug, Serialize)]
struct CatalogReport {
    groupings: BTreeMap<String, Vec<CleanerInfo>>,
    queries: Vec<AuditQuery>,
    matches: MatchReport,
}

pub(crate) fn run_from_cli(cli: crate::cli::Cli, ctx: &RunContext) -> Result<()> {
    let registry = builtin_registry().context("failed to build cleaner registry")?;

    match cli.command {
        Commands::Run(args) => {
            let config = MultiShotConfig::load(&cli.config)
                .inspect_err(|err| log_fatal(ctx, "load_config", err))
                .with_context(|| format!("failed to load config {}", cli.config.display()))?;
            let client = SparqlClient::new(config.sparql_client_config())
                .inspect_err(|err| log_fatal(ctx, "create_client", err))
                .context("failed to create SPARQL client")?
                .with_span(ctx.span().clone());
            tracing::info!(
                parent: ctx.span(),
                endpoint = %config.query_endpoint,
                "starting audit run"
            );
            let options = run_options(&args, &config);
            let summary = AuditRunner::new(ctx, &registry).run(&client, &options)?;
            print_json(&summary)?;
        }
        Commands::Catalog(args) => {
            let plan = AuditRunner::new(ctx, &registry)
                .plan(&args.queries, &CatalogFilter::default())?;
            print_json(&catalog_report(&registry, plan))?;
        }
    }
    Ok(())
}

fn log_fatal(ctx: &RunContext, operation: &str, err: &MultiShotError) {
    tracing::error!(
        parent: ctx.span(),
        operation,
        code = err.code(),
        error = %err,
        "aborting run"
    );
}

/// Command-line values win over the config file.
fn run_options(args: &RunArgs, config: &MultiShotConfig) -> RunOptions {
    RunOptions {
        queries_dir: args.queries.clone(),
        filter: CatalogFilter {
            query_glob: args.query_glob.clone(),
            cleaners: args.cleaners.clone(),
        },
        uris: args.uris.clone(),
        output_dir: args.output.clone().unwrap_or_else(|| config.output_dir()),
        write_mode: args.write_mode.unwrap_or_else(|| config.write_mode()),
    }
}

fn catalog_report(registry: &CleanerRegistry, plan: AuditPlan) -> CatalogReport {
    let mut groupings = BTreeMap::<String, Vec<CleanerInfo>>::new();
    for info in registry.describe() {
        groupings.entry(info.grouping.clone()).or_default().push(info);
    }
    CatalogReport {
        groupings,
        queries: plan.catalog.queries,
        matches: plan.matches,
    }
}

/// Process exit status for a failed command, taken from the first core error
/// in the cause chain.
pub(crate) fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MultiShotError>())
        .map_or(1, MultiShotError::exit_code)
}
