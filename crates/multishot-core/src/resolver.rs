use crate::catalog::AuditQuery;
use crate::context::RunContext;
use crate::error::{MultiShotError, Result};
use crate::models::{SemanticType, Subject};
use crate::sparql::{GraphClient, QueryResults};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubjects {
    pub subjects: Vec<Subject>,
    pub semantic_type: SemanticType,
    /// Variable the subjects were read from.
    pub variable: String,
}

/// Name of the first bound variable of the first row.
///
/// This is a convention of the query authors: the principal entity is always
/// selected first and named after its kind.
pub fn first_variable(results: &QueryResults) -> Result<&str> {
    let row = results.rows().first().ok_or_else(|| {
        MultiShotError::TypeResolution("query returned no rows".to_string())
    })?;
    row.first_variable().ok_or_else(|| {
        MultiShotError::TypeResolution("first result row has no bound variables".to_string())
    })
}

/// Runs `query` and returns its subjects in row order.
///
/// Placeholder queries are rendered once per entry of `uris`; plain queries
/// ignore `uris`.
pub fn resolve(
    ctx: &RunContext,
    graph: &dyn GraphClient,
    query: &AuditQuery,
    uris: &[String],
) -> Result<ResolvedSubjects> {
    if !query.targets_single_subject() {
        let results = graph.run_query(&query.text)?;
        return subjects_from_results(ctx, &query.name, &results);
    }

    if uris.is_empty() {
        return Err(MultiShotError::InvalidQuery(format!(
            "{} targets a single subject; pass at least one --uri",
            query.name
        )));
    }

    let mut merged: Option<ResolvedSubjects> = None;
    for uri in uris {
        let text = query.render_for(uri)?;
        let results = graph.run_query(&text)?;
        if results.is_empty() {
            tracing::info!(parent: ctx.span(), query = %query.name, uri = %uri, "no rows for uri");
            continue;
        }
        let resolved = subjects_from_results(ctx, &query.name, &results)?;
        if let Some(acc) = merged.as_mut() {
            // Every subject of one query shares the type resolved first.
            let semantic_type = acc.semantic_type;
            acc.subjects.extend(
                resolved
                    .subjects
                    .into_iter()
                    .map(|subject| Subject::new(subject.id, semantic_type)),
            );
        } else {
            merged = Some(resolved);
        }
    }

    merged.ok_or_else(|| {
        MultiShotError::TypeResolution(format!(
            "{} returned no rows for {} uri(s)",
            query.name,
            uris.len()
        ))
    })
}

fn subjects_from_results(
    ctx: &RunContext,
    query_name: &str,
    results: &QueryResults,
) -> Result<ResolvedSubjects> {
    let variable = first_variable(results)
        .map_err(|err| MultiShotError::TypeResolution(format!("{query_name}: {err}")))?
        .to_string();
    let semantic_type = SemanticType::from_variable(&variable);
    if semantic_type == SemanticType::Unknown {
        tracing::warn!(
            parent: ctx.span(),
            query = %query_name,
            variable = %variable,
            "cannot infer semantic type from first variable"
        );
    }

    let mut subjects = Vec::with_capacity(results.rows().len());
    for (index, row) in results.rows().iter().enumerate() {
        match row.value(&variable).filter(|value| !value.is_empty()) {
            Some(value) => subjects.push(Subject::new(value, semantic_type)),
            None => tracing::warn!(
                parent: ctx.span(),
                query = %query_name,
                row = index,
                variable = %variable,
                "row has no value for subject variable; skipping"
            ),
        }
    }

    Ok(ResolvedSubjects {
        subjects,
        semantic_type,
        variable,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::sparql::{Row, Term};

    struct RecordingGraph {
        responses: RefCell<Vec<QueryResults>>,
        seen: RefCell<Vec<String>>,
    }

    impl RecordingGraph {
        fn new(responses: Vec<QueryResults>) -> Self {
            Self {
                responses: RefCell::new(responses),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl GraphClient for RecordingGraph {
        fn run_query(&self, query: &str) -> Result<QueryResults> {
            self.seen.borrow_mut().push(query.to_string());
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                return Ok(QueryResults::default());
            }
            Ok(responses.remove(0))
        }
    }

    fn rows(variable: &str, values: &[&str]) -> QueryResults {
        QueryResults::from_rows(
            values
                .iter()
                .map(|value| Row::new(vec![(variable.to_string(), Term::uri(*value))]))
                .collect(),
        )
    }

    #[test]
    fn resolve_returns_subjects_in_row_order_with_inferred_type() {
        let ctx = RunContext::new(true);
        let graph = RecordingGraph::new(vec![rows(
            "pub",
            &["http://ex.org/p2", "http://ex.org/p1"],
        )]);
        let query = AuditQuery::new("pubs_dupe_authorships", "SELECT ?pub WHERE { ?pub a ?t }");

        let resolved = resolve(&ctx, &graph, &query, &[]).expect("resolve");
        assert_eq!(resolved.semantic_type, SemanticType::AcademicArticle);
        assert_eq!(
            resolved
                .subjects
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>(),
            vec!["http://ex.org/p2", "http://ex.org/p1"]
        );
    }

    #[test]
    fn type_comes_from_first_variable_of_first_row_only() {
        let ctx = RunContext::new(true);
        let results = QueryResults::from_rows(vec![
            Row::new(vec![
                ("person".to_string(), Term::uri("http://ex.org/a1")),
                ("pub".to_string(), Term::uri("http://ex.org/p1")),
            ]),
            Row::new(vec![
                ("pub".to_string(), Term::uri("http://ex.org/p2")),
                ("person".to_string(), Term::uri("http://ex.org/a2")),
            ]),
        ]);
        let graph = RecordingGraph::new(vec![results]);
        let query = AuditQuery::new("person_q", "SELECT ?person ?pub WHERE { ?person ?p ?pub }");

        let resolved = resolve(&ctx, &graph, &query, &[]).expect("resolve");
        assert_eq!(resolved.semantic_type, SemanticType::Person);
        assert_eq!(resolved.variable, "person");
        assert_eq!(resolved.subjects[1].id, "http://ex.org/a2");
    }

    #[test]
    fn empty_result_set_is_type_resolution_failure() {
        let ctx = RunContext::new(true);
        let graph = RecordingGraph::new(vec![QueryResults::default()]);
        let query = AuditQuery::new("q1", "SELECT ?pub WHERE { ?pub a ?t }");
        let err = resolve(&ctx, &graph, &query, &[]).expect_err("must fail");
        assert!(matches!(err, MultiShotError::TypeResolution(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn rows_missing_the_subject_variable_are_skipped() {
        let ctx = RunContext::new(true);
        let results = QueryResults::from_rows(vec![
            Row::new(vec![("pub".to_string(), Term::uri("http://ex.org/p1"))]),
            Row::new(vec![("other".to_string(), Term::uri("http://ex.org/x"))]),
        ]);
        let graph = RecordingGraph::new(vec![results]);
        let query = AuditQuery::new("q1", "SELECT ?pub WHERE { ?pub a ?t }");
        let resolved = resolve(&ctx, &graph, &query, &[]).expect("resolve");
        assert_eq!(resolved.subjects.len(), 1);
    }

    #[test]
    fn placeholder_query_runs_once_per_uri_and_concatenates() {
        let ctx = RunContext::new(true);
        let graph = RecordingGraph::new(vec![
            rows("pub", &["http://ex.org/p1"]),
            QueryResults::default(),
            rows("pub", &["http://ex.org/p3"]),
        ]);
        let query = AuditQuery::new("pub_one", "SELECT ?pub WHERE { BIND(<{}> AS ?pub) }");
        let uris = vec![
            "http://ex.org/p1".to_string(),
            "http://ex.org/p2".to_string(),
            "http://ex.org/p3".to_string(),
        ];

        let resolved = resolve(&ctx, &graph, &query, &uris).expect("resolve");
        assert_eq!(resolved.subjects.len(), 2);
        assert_eq!(resolved.subjects[1].id, "http://ex.org/p3");
        let seen = graph.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen[1].contains("<http://ex.org/p2>"));
    }

    #[test]
    fn placeholder_query_without_uris_is_rejected() {
        let ctx = RunContext::new(true);
        let graph = RecordingGraph::new(Vec::new());
        let query = AuditQuery::new("pub_one", "SELECT ?pub WHERE { BIND(<{}> AS ?pub) }");
        let err = resolve(&ctx, &graph, &query, &[]).expect_err("must fail");
        assert!(matches!(err, MultiShotError::InvalidQuery(_)));
        assert!(graph.seen.borrow().is_empty());
    }
}
