use std::path::{Path, PathBuf};

use crate::catalog::{AuditQuery, Catalog, CatalogFilter, load_catalog};
use crate::config::DEFAULT_OUTPUT_DIR;
use crate::context::RunContext;
use crate::engine::{AuditSpec, CorrectionEngine};
use crate::error::{MultiShotError, Result};
use crate::matcher::{MatchReport, match_queries};
use crate::models::RunSummary;
use crate::output::{OutputWriter, WriteMode};
use crate::registry::CleanerRegistry;
use crate::resolver::resolve;
use crate::sparql::GraphClient;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub queries_dir: PathBuf,
    pub filter: CatalogFilter,
    /// Subjects substituted into placeholder queries.
    pub uris: Vec<String>,
    pub output_dir: PathBuf,
    pub write_mode: WriteMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            queries_dir: PathBuf::from("queries"),
            filter: CatalogFilter::default(),
            uris: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            write_mode: WriteMode::default(),
        }
    }
}

/// Matched specs ready to run, plus what was left out.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    pub catalog: Catalog,
    pub matches: MatchReport,
    pub specs: Vec<(AuditQuery, AuditSpec)>,
}

pub struct AuditRunner<'a> {
    ctx: &'a RunContext,
    registry: &'a CleanerRegistry,
}

impl<'a> AuditRunner<'a> {
    pub fn new(ctx: &'a RunContext, registry: &'a CleanerRegistry) -> Self {
        Self { ctx, registry }
    }

    /// Loads the catalog, matches queries to cleaners and builds every spec.
    /// Nothing is sent to the graph.
    pub fn plan(&self, queries_dir: &Path, filter: &CatalogFilter) -> Result<AuditPlan> {
        let catalog = load_catalog(queries_dir, self.registry, filter)
            .inspect_err(|err| self.log_fatal("load_catalog", err))?;
        tracing::info!(
            parent: self.ctx.span(),
            queries = ?catalog.query_names(),
            "queries found in catalog"
        );

        let matches = match_queries(
            self.ctx,
            &catalog.query_names(),
            &catalog.cleaners,
            &catalog.excluded_cleaners,
        );
        let mut specs = Vec::with_capacity(matches.pairs.len());
        for query in &catalog.queries {
            let Some(cleaner_name) = matches.pairs.get(&query.name) else {
                continue;
            };
            let spec = self
                .registry
                .lookup(cleaner_name)
                .and_then(|cleaner| AuditSpec::new(query, cleaner))
                .inspect_err(|err| self.log_fatal("build_spec", err))?;
            specs.push((query.clone(), spec));
        }

        Ok(AuditPlan {
            catalog,
            matches,
            specs,
        })
    }

    pub fn run(&self, graph: &dyn GraphClient, options: &RunOptions) -> Result<RunSummary> {
        let plan = self.plan(&options.queries_dir, &options.filter)?;
        self.execute(graph, &plan, options)
    }

    pub fn execute(
        &self,
        graph: &dyn GraphClient,
        plan: &AuditPlan,
        options: &RunOptions,
    ) -> Result<RunSummary> {
        let writer = OutputWriter::new(&options.output_dir, self.ctx, options.write_mode);
        let engine = CorrectionEngine::new(self.ctx, graph, &writer);

        let mut summary = RunSummary {
            run_id: self.ctx.run_id().to_string(),
            run_date: self.ctx.run_date_label(),
            unmatched_queries: plan.matches.unmatched.clone(),
            filtered_queries: plan.matches.filtered.clone(),
            queries: Vec::with_capacity(plan.specs.len()),
        };

        tracing::info!(
            parent: self.ctx.span(),
            specs = plan.specs.len(),
            output = %options.output_dir.display(),
            write_mode = writer.mode().as_str(),
            "running queries"
        );
        for (query, spec) in &plan.specs {
            tracing::info!(parent: self.ctx.span(), query = %query.name, "attempting query");
            let resolved = resolve(self.ctx, graph, query, &options.uris)
                .inspect_err(|err| self.log_fatal("resolve", err))?;
            tracing::info!(
                parent: self.ctx.span(),
                query = %query.name,
                subjects = resolved.subjects.len(),
                semantic_type = %resolved.semantic_type,
                variable = %resolved.variable,
                "query was successful"
            );

            let report = engine
                .run(spec, &resolved.subjects)
                .inspect_err(|err| self.log_fatal("write", err))?;
            summary.queries.push(report);
        }

        tracing::info!(
            parent: self.ctx.span(),
            total_corrected = summary.total_corrected(),
            total_failures = summary.total_failures(),
            "total datum corrected"
        );
        Ok(summary)
    }

    fn log_fatal(&self, operation: &str, err: &MultiShotError) {
        let payload = err.to_payload(operation, self.ctx.run_id(), None);
        tracing::error!(
            parent: self.ctx.span(),
            operation = %payload.operation,
            code = %payload.code,
            error = %payload.message,
            "aborting run"
        );
    }
}
