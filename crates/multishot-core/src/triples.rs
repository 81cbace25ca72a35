use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MultiShotError;

/// Statement terminator used for every line of an output file.
pub const STATEMENT_TERMINATOR: &str = " . \n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Add,
    Sub,
}

impl Direction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = MultiShotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "sub" => Ok(Self::Sub),
            other => Err(MultiShotError::Validation(format!(
                "unknown direction: {other}"
            ))),
        }
    }
}

/// Ordered RDF statements (`subject predicate object`, no terminator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripleSet {
    statements: Vec<String>,
}

impl TripleSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn extend(&mut self, other: Self) {
        self.statements.extend(other.statements);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.statements
    }

    /// Returns the first statement that cannot be written as one output line.
    #[must_use]
    pub fn first_unusable(&self) -> Option<(usize, &str)> {
        self.statements
            .iter()
            .enumerate()
            .find(|(_, statement)| {
                statement.trim().is_empty() || statement.contains(['\n', '\r'])
            })
            .map(|(index, statement)| (index, statement.as_str()))
    }

    /// Serialized file body: every statement followed by `" . \n"`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push_str(STATEMENT_TERMINATOR);
        }
        out
    }
}

impl From<Vec<String>> for TripleSet {
    fn from(statements: Vec<String>) -> Self {
        Self { statements }
    }
}

impl<S: Into<String>> FromIterator<S> for TripleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            statements: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for TripleSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}
