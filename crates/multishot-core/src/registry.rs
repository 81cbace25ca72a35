use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MultiShotError, Result};
use crate::models::Subject;
use crate::sparql::GraphClient;
use crate::triples::{Direction, TripleSet};

pub const CLEANER_PREFIX: &str = "clean_";
pub const GROUPING_SUFFIX: &str = "_audits";

/// Defect class a cleaner belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanerCategory {
    Pub,
    Person,
    Misc,
}

impl CleanerCategory {
    pub const ALL: [Self; 3] = [Self::Pub, Self::Person, Self::Misc];

    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Pub => "pub_",
            Self::Person => "person_",
            Self::Misc => "misc_",
        }
    }

    /// Catalog grouping name, e.g. `pub_audits`.
    #[must_use]
    pub fn grouping(&self) -> String {
        format!("{}{GROUPING_SUFFIX}", self.prefix().trim_end_matches('_'))
    }
}

impl Display for CleanerCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix().trim_end_matches('_'))
    }
}

impl FromStr for CleanerCategory {
    type Err = MultiShotError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.strip_suffix(GROUPING_SUFFIX).unwrap_or(s);
        match key {
            "pub" => Ok(Self::Pub),
            "person" => Ok(Self::Person),
            "misc" => Ok(Self::Misc),
            other => Err(MultiShotError::Validation(format!(
                "unknown cleaner category: {other}"
            ))),
        }
    }
}

/// One direction of a cleaner: computes the statements for a single subject.
///
/// Implementations must only read from the graph and must be deterministic for
/// a fixed store state.
pub trait TripleGenerator: Send + Sync {
    fn generate(&self, graph: &dyn GraphClient, subject: &Subject) -> Result<TripleSet>;
}

impl<F> TripleGenerator for F
where
    F: Fn(&dyn GraphClient, &Subject) -> Result<TripleSet> + Send + Sync,
{
    fn generate(&self, graph: &dyn GraphClient, subject: &Subject) -> Result<TripleSet> {
        self(graph, subject)
    }
}

#[derive(Clone)]
pub struct Cleaner {
    name: String,
    category: CleanerCategory,
    add: Option<Arc<dyn TripleGenerator>>,
    sub: Option<Arc<dyn TripleGenerator>>,
}

impl std::fmt::Debug for Cleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("add", &self.add.is_some())
            .field("sub", &self.sub.is_some())
            .finish()
    }
}

impl Cleaner {
    pub fn new(name: impl Into<String>, category: CleanerCategory) -> Self {
        Self {
            name: name.into(),
            category,
            add: None,
            sub: None,
        }
    }

    #[must_use]
    pub fn with_add(mut self, generator: impl TripleGenerator + 'static) -> Self {
        self.add = Some(Arc::new(generator));
        self
    }

    #[must_use]
    pub fn with_sub(mut self, generator: impl TripleGenerator + 'static) -> Self {
        self.sub = Some(Arc::new(generator));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn category(&self) -> CleanerCategory {
        self.category
    }

    #[must_use]
    pub fn operation(&self, direction: Direction) -> Option<&Arc<dyn TripleGenerator>> {
        match direction {
            Direction::Add => self.add.as_ref(),
            Direction::Sub => self.sub.as_ref(),
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> Vec<Direction> {
        [Direction::Add, Direction::Sub]
            .into_iter()
            .filter(|direction| self.operation(*direction).is_some())
            .collect()
    }

    /// Query name this cleaner answers to (`clean_X` -> `X`).
    #[must_use]
    pub fn query_name(&self) -> Option<&str> {
        self.name.strip_prefix(CLEANER_PREFIX)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanerInfo {
    pub name: String,
    pub category: CleanerCategory,
    pub grouping: String,
    pub operations: Vec<Direction>,
}

/// Cleaners available to a run, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct CleanerRegistry {
    cleaners: BTreeMap<String, Cleaner>,
}

impl CleanerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, cleaner: Cleaner) -> Result<()> {
        if !cleaner.name.starts_with(CLEANER_PREFIX) {
            return Err(MultiShotError::Validation(format!(
                "cleaner name must start with {CLEANER_PREFIX}: {}",
                cleaner.name
            )));
        }
        if self.cleaners.contains_key(&cleaner.name) {
            return Err(MultiShotError::Validation(format!(
                "cleaner already registered: {}",
                cleaner.name
            )));
        }
        self.cleaners.insert(cleaner.name.clone(), cleaner);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cleaner> {
        self.cleaners.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&Cleaner> {
        self.get(name).ok_or_else(|| {
            MultiShotError::OperationLookup(format!("no cleaner registered as {name}"))
        })
    }

    /// Sorted cleaner names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.cleaners.keys().cloned().collect()
    }

    #[must_use]
    pub fn describe(&self) -> Vec<CleanerInfo> {
        self.cleaners
            .values()
            .map(|cleaner| CleanerInfo {
                name: cleaner.name.clone(),
                category: cleaner.category,
                grouping: cleaner.category.grouping(),
                operations: cleaner.capabilities(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cleaners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cleaners.is_empty()
    }
}
