//! Cleaners for publication defects.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::{AuthorshipRelation, Subject};
use crate::sparql::GraphClient;
use crate::triples::TripleSet;

pub const DUPE_AUTHORSHIPS: &str = "clean_pubs_dupe_authorships";

const VIVO_RELATED_BY: &str = "http://vivoweb.org/ontology/core#relatedBy";
const VIVO_RELATES: &str = "http://vivoweb.org/ontology/core#relates";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const FOAF_PERSON: &str = "http://xmlns.com/foaf/0.1/Person";

#[must_use]
pub fn authorship_query(subject_id: &str) -> String {
    format!(
        "SELECT ?author ?relation\n\
         WHERE {{\n  \
           <{subject_id}> <{VIVO_RELATED_BY}> ?relation .\n  \
           ?relation <{VIVO_RELATES}> ?author .\n  \
           ?author <{RDF_TYPE}> <{FOAF_PERSON}> .\n\
         }}\n"
    )
}

/// Every `(author, relation)` pair linking a person to `subject_id`, in
/// retrieval order.
pub fn fetch_authorships(
    graph: &dyn GraphClient,
    subject_id: &str,
) -> Result<Vec<AuthorshipRelation>> {
    let results = graph.run_query(&authorship_query(subject_id))?;
    Ok(results
        .rows()
        .iter()
        .filter_map(|row| {
            let author_id = row.value("author").filter(|v| !v.is_empty())?;
            let relation_node_id = row.value("relation").filter(|v| !v.is_empty())?;
            Some(AuthorshipRelation {
                author_id: author_id.to_string(),
                relation_node_id: relation_node_id.to_string(),
            })
        })
        .collect())
}

/// Relation records beyond the first one seen for each author.
#[must_use]
pub fn redundant_relations(relations: &[AuthorshipRelation]) -> Vec<&str> {
    let mut canonical = HashMap::<&str, &str>::new();
    let mut flagged = HashSet::<&str>::new();
    let mut out = Vec::new();
    for relation in relations {
        let author = relation.author_id.as_str();
        let node = relation.relation_node_id.as_str();
        match canonical.get(author) {
            None => {
                canonical.insert(author, node);
            }
            Some(first) if *first == node => {}
            Some(_) => {
                if flagged.insert(node) {
                    out.push(node);
                }
            }
        }
    }
    out
}

/// Removal set for a publication whose authors are related more than once:
/// the full closure of every non-canonical relation record.
pub fn detect_duplicate_authorships(
    graph: &dyn GraphClient,
    subject: &Subject,
) -> Result<TripleSet> {
    let relations = fetch_authorships(graph, &subject.id)?;
    let mut triples = TripleSet::new();
    for relation in redundant_relations(&relations) {
        triples.extend(graph.node_closure(relation)?);
    }
    Ok(triples)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::SemanticType;
    use crate::sparql::{QueryResults, Row, Term};

    /// Answers the authorship query from fixed pairs and closures from a map.
    struct AuthorshipGraph {
        pairs: Vec<(&'static str, &'static str)>,
        closures: HashMap<&'static str, Vec<&'static str>>,
    }

    impl GraphClient for AuthorshipGraph {
        fn run_query(&self, query: &str) -> Result<QueryResults> {
            assert!(query.contains(VIVO_RELATED_BY));
            Ok(QueryResults::from_rows(
                self.pairs
                    .iter()
                    .map(|(author, relation)| {
                        Row::new(vec![
                            ("author".to_string(), Term::uri(*author)),
                            ("relation".to_string(), Term::uri(*relation)),
                        ])
                    })
                    .collect(),
            ))
        }

        fn node_closure(&self, node: &str) -> Result<TripleSet> {
            Ok(self
                .closures
                .get(node)
                .map(|lines| TripleSet::from_iter(lines.iter().copied()))
                .unwrap_or_default())
        }
    }

    fn subject() -> Subject {
        Subject::new("http://ex.org/pub1", SemanticType::AcademicArticle)
    }

    fn graph() -> AuthorshipGraph {
        AuthorshipGraph {
            pairs: vec![
                ("A", "r1"),
                ("B", "r4"),
                ("A", "r2"),
                ("A", "r3"),
            ],
            closures: HashMap::from([
                ("r1", vec!["<r1> <p> <o1>"]),
                ("r2", vec!["<r2> <p> <o2>", "<r2> <q> <o2b>"]),
                ("r3", vec!["<r3> <p> <o3>"]),
                ("r4", vec!["<r4> <p> <o4>"]),
            ]),
        }
    }

    #[test]
    fn removes_closures_of_all_but_first_relation_per_author() {
        let triples = detect_duplicate_authorships(&graph(), &subject()).expect("detect");
        assert_eq!(
            triples.as_slice(),
            [
                "<r2> <p> <o2>".to_string(),
                "<r2> <q> <o2b>".to_string(),
                "<r3> <p> <o3>".to_string(),
            ]
        );
    }

    #[test]
    fn single_relation_authors_contribute_nothing() {
        let graph = AuthorshipGraph {
            pairs: vec![("A", "r1"), ("B", "r4")],
            closures: graph().closures,
        };
        let triples = detect_duplicate_authorships(&graph, &subject()).expect("detect");
        assert!(triples.is_empty());
    }

    #[test]
    fn repeated_rows_for_the_same_redundant_relation_are_fetched_once() {
        let graph = AuthorshipGraph {
            pairs: vec![("A", "r1"), ("A", "r2"), ("A", "r2")],
            closures: graph().closures,
        };
        let triples = detect_duplicate_authorships(&graph, &subject()).expect("detect");
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn repeated_canonical_relation_is_never_removed() {
        let graph = AuthorshipGraph {
            pairs: vec![("A", "r1"), ("A", "r2"), ("A", "r1")],
            closures: graph().closures,
        };
        let triples = detect_duplicate_authorships(&graph, &subject()).expect("detect");
        assert!(triples.iter().all(|line| line.starts_with("<r2>")));
    }

    #[test]
    fn detection_is_stable_on_unchanged_store() {
        let graph = graph();
        let first = detect_duplicate_authorships(&graph, &subject()).expect("first");
        let second = detect_duplicate_authorships(&graph, &subject()).expect("second");
        let as_set = |t: &TripleSet| t.iter().map(str::to_string).collect::<BTreeSet<_>>();
        assert_eq!(as_set(&first), as_set(&second));
    }

    #[test]
    fn authorship_query_targets_subject_and_person_type() {
        let query = authorship_query("http://ex.org/pub1");
        assert!(query.contains(&format!("<http://ex.org/pub1> <{VIVO_RELATED_BY}> ?relation .")));
        assert!(query.contains(&format!("?author <{RDF_TYPE}> <{FOAF_PERSON}> .")));
    }
}
