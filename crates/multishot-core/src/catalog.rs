use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{MultiShotError, Result};
use crate::registry::CleanerRegistry;

pub const QUERY_EXTENSION: &str = "rq";
pub const SUBJECT_PLACEHOLDER: &str = "{}";

/// A query file from the catalog directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditQuery {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip)]
    pub text: String,
}

impl AuditQuery {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(format!("{name}.{QUERY_EXTENSION}")),
            name,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.text.matches(SUBJECT_PLACEHOLDER).count()
    }

    #[must_use]
    pub fn targets_single_subject(&self) -> bool {
        self.placeholder_count() > 0
    }

    /// Query text with the subject placeholder replaced by `uri`.
    pub fn render_for(&self, uri: &str) -> Result<String> {
        match self.placeholder_count() {
            1 => Ok(self.text.replacen(SUBJECT_PLACEHOLDER, uri, 1)),
            0 => Err(MultiShotError::InvalidQuery(format!(
                "{} has no {SUBJECT_PLACEHOLDER} placeholder",
                self.name
            ))),
            n => Err(MultiShotError::InvalidQuery(format!(
                "{} has {n} {SUBJECT_PLACEHOLDER} placeholders, expected one",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Glob over query names (without extension).
    pub query_glob: Option<String>,
    /// Restrict the run to these cleaner names.
    pub cleaners: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub queries: Vec<AuditQuery>,
    pub cleaners: Vec<String>,
    /// Registered cleaners left out by `CatalogFilter::cleaners`.
    pub excluded_cleaners: Vec<String>,
}

impl Catalog {
    #[must_use]
    pub fn query_names(&self) -> Vec<String> {
        self.queries.iter().map(|query| query.name.clone()).collect()
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&AuditQuery> {
        self.queries.iter().find(|query| query.name == name)
    }
}

/// Loads the query files under `queries_dir` and the registered cleaner names.
///
/// Any failure to list or read the query directory is a `Catalog` error:
/// there is nothing to run without it.
pub fn load_catalog(
    queries_dir: &Path,
    registry: &CleanerRegistry,
    filter: &CatalogFilter,
) -> Result<Catalog> {
    let matcher = filter
        .query_glob
        .as_deref()
        .map(compile_query_glob)
        .transpose()?;

    let mut queries = list_query_files(queries_dir)?
        .into_iter()
        .filter(|(name, _)| matcher.as_ref().is_none_or(|m| m.is_match(name)))
        .map(|(name, path)| {
            let text = fs::read_to_string(&path).map_err(|err| {
                MultiShotError::Catalog(format!("cannot read {}: {err}", path.display()))
            })?;
            Ok(AuditQuery { name, path, text })
        })
        .collect::<Result<Vec<_>>>()?;
    queries.sort_by(|a, b| a.name.cmp(&b.name));

    let registered = registry.names();
    let cleaners = if filter.cleaners.is_empty() {
        registered.clone()
    } else {
        let mut selected = Vec::with_capacity(filter.cleaners.len());
        for name in &filter.cleaners {
            registry.lookup(name)?;
            selected.push(name.clone());
        }
        selected.sort();
        selected.dedup();
        selected
    };

    let excluded_cleaners = registered
        .into_iter()
        .filter(|name| !cleaners.contains(name))
        .collect();

    Ok(Catalog {
        queries,
        cleaners,
        excluded_cleaners,
    })
}

/// `(name, path)` for every `*.rq` file directly under `dir`, sorted by name.
pub fn list_query_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(MultiShotError::Catalog(format!(
            "query directory not found: {}",
            dir.display()
        )));
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            MultiShotError::Catalog(format!("cannot list {}: {err}", dir.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(QUERY_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        out.push((stem.to_string(), path.to_path_buf()));
    }
    Ok(out)
}

fn compile_query_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|err| MultiShotError::Validation(format!("invalid query glob {pattern}: {err}")))
}
