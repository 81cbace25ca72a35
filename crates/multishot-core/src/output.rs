use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::context::RunContext;
use crate::error::{MultiShotError, Result};
use crate::triples::{Direction, TripleSet};

/// How an output file that already exists on disk is treated.
///
/// `Append` accumulates statements across re-runs on the same day without
/// deduplication. `Truncate` replaces the file the first time this run
/// touches it and appends for the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Append,
    Truncate,
}

impl WriteMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Truncate => "truncate",
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = MultiShotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "truncate" => Ok(Self::Truncate),
            other => Err(MultiShotError::Validation(format!(
                "unknown write mode: {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct OutputWriter {
    root: PathBuf,
    run_date: String,
    mode: WriteMode,
    touched: Mutex<HashSet<PathBuf>>,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>, ctx: &RunContext, mode: WriteMode) -> Self {
        Self {
            root: root.into(),
            run_date: ctx.run_date_label(),
            mode,
            touched: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> WriteMode {
        self.mode
    }

    /// `<root>/<run date>/<subject local name>/<cleaner>_<direction>.rdf`
    pub fn path_for(
        &self,
        subject_id: &str,
        cleaner_name: &str,
        direction: Direction,
    ) -> Result<PathBuf> {
        Ok(self
            .root
            .join(&self.run_date)
            .join(subject_local_name(subject_id)?)
            .join(format!("{cleaner_name}_{direction}.rdf")))
    }

    /// Writes `triples` and returns the target path, or `None` when there
    /// was nothing to write.
    pub fn write(
        &self,
        triples: &TripleSet,
        subject_id: &str,
        cleaner_name: &str,
        direction: Direction,
    ) -> Result<Option<PathBuf>> {
        if triples.is_empty() {
            return Ok(None);
        }

        let path = self.path_for(subject_id, cleaner_name, direction)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let truncate = self.mode == WriteMode::Truncate && self.first_touch(&path)?;
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let mut file = options.open(&path)?;
        file.write_all(triples.render().as_bytes())?;
        file.flush()?;
        Ok(Some(path))
    }

    fn first_touch(&self, path: &Path) -> Result<bool> {
        let mut touched = self
            .touched
            .lock()
            .map_err(|_| MultiShotError::Internal("output writer lock poisoned".to_string()))?;
        Ok(touched.insert(path.to_path_buf()))
    }
}

/// Last `/`-separated segment of a subject URI. Empty and dot segments would
/// land outside the subject's own directory and are rejected.
pub fn subject_local_name(subject_id: &str) -> Result<&str> {
    let local = subject_id.rsplit('/').next().unwrap_or(subject_id);
    if local.is_empty() || local == "." || local == ".." {
        return Err(MultiShotError::InvalidSubject(format!(
            "no usable local name in {subject_id:?}"
        )));
    }
    Ok(local)
}
