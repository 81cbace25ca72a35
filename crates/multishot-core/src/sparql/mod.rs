use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::triples::TripleSet;

mod client;

pub use client::{SparqlClient, SparqlClientConfig};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    TypedLiteral,
    Bnode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// N-Triples rendering of the term.
    #[must_use]
    pub fn to_ntriples(&self) -> String {
        match self.kind {
            TermKind::Uri => format!("<{}>", self.value),
            TermKind::Bnode => format!("_:{}", self.value),
            TermKind::Literal | TermKind::TypedLiteral => {
                let escaped = escape_literal(&self.value);
                if let Some(lang) = self.lang.as_deref().filter(|l| !l.is_empty()) {
                    format!("\"{escaped}\"@{lang}")
                } else if let Some(datatype) = self.datatype.as_deref() {
                    format!("\"{escaped}\"^^<{datatype}>")
                } else {
                    format!("\"{escaped}\"")
                }
            }
        }
    }
}

fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// One result row. Variables keep the order in which the endpoint returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    bindings: Vec<(String, Term)>,
}

impl Row {
    #[must_use]
    pub fn new(bindings: Vec<(String, Term)>) -> Self {
        Self { bindings }
    }

    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, term)| term)
    }

    #[must_use]
    pub fn value(&self, variable: &str) -> Option<&str> {
        self.get(variable).map(|term| term.value.as_str())
    }

    #[must_use]
    pub fn first_variable(&self) -> Option<&str> {
        self.bindings.first().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of variable bindings")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Row, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut bindings = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, term)) = access.next_entry::<String, Term>()? {
                    bindings.push((name, term));
                }
                Ok(Row { bindings })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBindings {
    #[serde(default)]
    pub bindings: Vec<Row>,
}

/// SPARQL 1.1 JSON results document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub head: ResultHead,
    #[serde(default)]
    pub results: ResultBindings,
}

impl QueryResults {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let vars = rows
            .first()
            .map(|row| row.bindings.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default();
        Self {
            head: ResultHead { vars },
            results: ResultBindings { bindings: rows },
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.results.bindings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }
}

/// Read-only access to the triple store.
pub trait GraphClient {
    fn run_query(&self, query: &str) -> Result<QueryResults>;

    /// Every statement whose subject is `node`, in retrieval order.
    fn node_closure(&self, node: &str) -> Result<TripleSet> {
        let results = self.run_query(&node_closure_query(node))?;
        Ok(closure_from_results(node, &results))
    }
}

impl<T: GraphClient + ?Sized> GraphClient for &T {
    fn run_query(&self, query: &str) -> Result<QueryResults> {
        (**self).run_query(query)
    }

    fn node_closure(&self, node: &str) -> Result<TripleSet> {
        (**self).node_closure(node)
    }
}

#[must_use]
pub fn node_closure_query(node: &str) -> String {
    format!("SELECT ?p ?o WHERE {{ <{node}> ?p ?o . }}")
}

fn closure_from_results(node: &str, results: &QueryResults) -> TripleSet {
    results
        .rows()
        .iter()
        .filter_map(|row| {
            let predicate = row.get("p")?;
            let object = row.get("o")?;
            Some(format!(
                "<{node}> {} {}",
                predicate.to_ntriples(),
                object.to_ntriples()
            ))
        })
        .collect()
}
