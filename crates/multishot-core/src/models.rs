use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::triples::TripleSet;

/// Coarse entity kind of the subjects a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Person,
    AcademicArticle,
    Unknown,
}

impl SemanticType {
    /// Infers the type from a SPARQL variable name such as `?pub` or `?person`.
    #[must_use]
    pub fn from_variable(name: &str) -> Self {
        let lower = name.trim_start_matches(['?', '$']).to_ascii_lowercase();
        if ["person", "author", "people"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            return Self::Person;
        }
        if ["pub", "article", "doc"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            return Self::AcademicArticle;
        }
        Self::Unknown
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::AcademicArticle => "academic_article",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for SemanticType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub semantic_type: SemanticType,
}

impl Subject {
    pub fn new(id: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            id: id.into(),
            semantic_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorshipRelation {
    pub author_id: String,
    pub relation_node_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionResult {
    pub subject_id: String,
    pub cleaner_name: String,
    pub add_triples: TripleSet,
    pub sub_triples: TripleSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    pub subject_id: String,
    pub cleaner_name: String,
    pub direction: crate::triples::Direction,
    pub message: String,
}

/// Outcome of running one matched query through its cleaner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    pub query_name: String,
    pub cleaner_name: String,
    pub semantic_type: Option<SemanticType>,
    pub subjects: usize,
    pub add_statements: usize,
    pub sub_statements: usize,
    pub failures: Vec<OperationFailure>,
    pub files_written: Vec<PathBuf>,
}

impl QueryReport {
    #[must_use]
    pub const fn corrected(&self) -> usize {
        self.add_statements + self.sub_statements
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub run_date: String,
    pub unmatched_queries: Vec<String>,
    pub filtered_queries: Vec<String>,
    pub queries: Vec<QueryReport>,
}

impl RunSummary {
    #[must_use]
    pub fn total_corrected(&self) -> usize {
        self.queries.iter().map(QueryReport::corrected).sum()
    }

    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.queries.iter().map(|report| report.failures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_type_follows_variable_naming_convention() {
        assert_eq!(SemanticType::from_variable("pub"), SemanticType::AcademicArticle);
        assert_eq!(SemanticType::from_variable("?publication"), SemanticType::AcademicArticle);
        assert_eq!(SemanticType::from_variable("person"), SemanticType::Person);
        assert_eq!(SemanticType::from_variable("Author"), SemanticType::Person);
        assert_eq!(SemanticType::from_variable("grant"), SemanticType::Unknown);
    }

    #[test]
    fn summary_totals_add_up_reports() {
        let summary = RunSummary {
            queries: vec![
                QueryReport {
                    add_statements: 1,
                    sub_statements: 4,
                    ..QueryReport::default()
                },
                QueryReport {
                    sub_statements: 2,
                    ..QueryReport::default()
                },
            ],
            ..RunSummary::default()
        };
        assert_eq!(summary.total_corrected(), 7);
        assert_eq!(summary.total_failures(), 0);
    }
}
