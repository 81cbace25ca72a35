use std::sync::Arc;

use crate::catalog::AuditQuery;
use crate::context::RunContext;
use crate::error::{MultiShotError, Result};
use crate::models::{CorrectionResult, OperationFailure, QueryReport, Subject};
use crate::output::{OutputWriter, subject_local_name};
use crate::registry::{Cleaner, TripleGenerator};
use crate::sparql::GraphClient;
use crate::triples::{Direction, TripleSet};

/// A query paired with the operations of its cleaner. Immutable for the run.
#[derive(Clone)]
pub struct AuditSpec {
    pub query_name: String,
    pub query_text: String,
    pub cleaner_name: String,
    add: Option<Arc<dyn TripleGenerator>>,
    sub: Option<Arc<dyn TripleGenerator>>,
}

impl std::fmt::Debug for AuditSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSpec")
            .field("query_name", &self.query_name)
            .field("cleaner_name", &self.cleaner_name)
            .field("add", &self.add.is_some())
            .field("sub", &self.sub.is_some())
            .finish_non_exhaustive()
    }
}

impl AuditSpec {
    /// Fails with `OperationLookup` when the cleaner declares no operation.
    pub fn new(query: &AuditQuery, cleaner: &Cleaner) -> Result<Self> {
        let add = cleaner.operation(Direction::Add).cloned();
        let sub = cleaner.operation(Direction::Sub).cloned();
        if add.is_none() && sub.is_none() {
            return Err(MultiShotError::OperationLookup(format!(
                "cleaner {} declares neither an add nor a sub operation",
                cleaner.name()
            )));
        }
        Ok(Self {
            query_name: query.name.clone(),
            query_text: query.text.clone(),
            cleaner_name: cleaner.name().to_string(),
            add,
            sub,
        })
    }

    fn operation(&self, direction: Direction) -> Option<&Arc<dyn TripleGenerator>> {
        match direction {
            Direction::Add => self.add.as_ref(),
            Direction::Sub => self.sub.as_ref(),
        }
    }
}

/// Output of one engine pass before anything is written.
#[derive(Debug, Clone, Default)]
pub struct CorrectionBatch {
    pub results: Vec<CorrectionResult>,
    pub failures: Vec<OperationFailure>,
}

pub struct CorrectionEngine<'a> {
    ctx: &'a RunContext,
    graph: &'a dyn GraphClient,
    writer: &'a OutputWriter,
}

impl<'a> CorrectionEngine<'a> {
    pub fn new(ctx: &'a RunContext, graph: &'a dyn GraphClient, writer: &'a OutputWriter) -> Self {
        Self { ctx, graph, writer }
    }

    /// Runs both directions for every subject. A failing operation empties
    /// only its own direction for its own subject. Subjects with no usable
    /// output directory fail every declared direction without running.
    pub fn correct(&self, spec: &AuditSpec, subjects: &[Subject]) -> CorrectionBatch {
        let mut batch = CorrectionBatch::default();
        for subject in subjects {
            if let Err(err) = subject_local_name(&subject.id) {
                self.reject_subject(spec, subject, &err, &mut batch);
                continue;
            }
            let mut result = CorrectionResult {
                subject_id: subject.id.clone(),
                cleaner_name: spec.cleaner_name.clone(),
                ..CorrectionResult::default()
            };
            for direction in [Direction::Sub, Direction::Add] {
                let triples = match self.run_operation(spec, subject, direction) {
                    Ok(triples) => triples,
                    Err(failure) => {
                        batch.failures.push(failure);
                        TripleSet::new()
                    }
                };
                match direction {
                    Direction::Add => result.add_triples = triples,
                    Direction::Sub => result.sub_triples = triples,
                }
            }
            batch.results.push(result);
        }
        batch
    }

    /// Corrects every subject, then writes each non-empty triple set.
    pub fn run(&self, spec: &AuditSpec, subjects: &[Subject]) -> Result<QueryReport> {
        let batch = self.correct(spec, subjects);

        let mut report = QueryReport {
            query_name: spec.query_name.clone(),
            cleaner_name: spec.cleaner_name.clone(),
            semantic_type: subjects.first().map(|subject| subject.semantic_type),
            subjects: subjects.len(),
            failures: batch.failures,
            ..QueryReport::default()
        };

        for result in &batch.results {
            for (direction, triples) in [
                (Direction::Add, &result.add_triples),
                (Direction::Sub, &result.sub_triples),
            ] {
                let written =
                    self.writer
                        .write(triples, &result.subject_id, &result.cleaner_name, direction)?;
                if let Some(path) = written {
                    match direction {
                        Direction::Add => report.add_statements += triples.len(),
                        Direction::Sub => report.sub_statements += triples.len(),
                    }
                    tracing::debug!(
                        parent: self.ctx.span(),
                        subject = %result.subject_id,
                        path = %path.display(),
                        statements = triples.len(),
                        "wrote corrections"
                    );
                    report.files_written.push(path);
                }
            }
        }

        tracing::info!(
            parent: self.ctx.span(),
            query = %spec.query_name,
            cleaner = %spec.cleaner_name,
            corrected = report.corrected(),
            failures = report.failures.len(),
            "datum corrected"
        );
        Ok(report)
    }

    fn reject_subject(
        &self,
        spec: &AuditSpec,
        subject: &Subject,
        err: &MultiShotError,
        batch: &mut CorrectionBatch,
    ) {
        let payload = err.to_payload("correct", self.ctx.run_id(), Some(subject.id.clone()));
        tracing::warn!(
            parent: self.ctx.span(),
            cleaner = %spec.cleaner_name,
            subject = ?payload.subject,
            code = %payload.code,
            error = %payload.message,
            "skipping subject"
        );
        for direction in [Direction::Sub, Direction::Add] {
            if spec.operation(direction).is_some() {
                batch.failures.push(OperationFailure {
                    subject_id: subject.id.clone(),
                    cleaner_name: spec.cleaner_name.clone(),
                    direction,
                    message: payload.message.clone(),
                });
            }
        }
    }

    fn run_operation(
        &self,
        spec: &AuditSpec,
        subject: &Subject,
        direction: Direction,
    ) -> std::result::Result<TripleSet, OperationFailure> {
        let Some(operation) = spec.operation(direction) else {
            return Ok(TripleSet::new());
        };

        let failure = |message: String| {
            tracing::error!(
                parent: self.ctx.span(),
                cleaner = %spec.cleaner_name,
                subject = %subject.id,
                direction = %direction,
                error = %message,
                "could not run cleaner on subject"
            );
            OperationFailure {
                subject_id: subject.id.clone(),
                cleaner_name: spec.cleaner_name.clone(),
                direction,
                message,
            }
        };

        match operation.generate(self.graph, subject) {
            Ok(triples) => {
                if let Some((index, statement)) = triples.first_unusable() {
                    return Err(failure(format!(
                        "unusable statement at {index}: {statement:?}"
                    )));
                }
                Ok(triples)
            }
            Err(err) => Err(failure(err.to_string())),
        }
    }
}
