use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MultiShotError, Result};
use crate::output::WriteMode;
use crate::sparql::SparqlClientConfig;

mod env;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "data_out";

/// Contents of `config.yaml`. The file is shared with the upload tool, so
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiShotConfig {
    #[serde(default)]
    pub query_endpoint: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub update_endpoint: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub write_mode: Option<WriteMode>,
}

impl MultiShotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            MultiShotError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let mut config = Self::parse(&raw)?;
        config.apply_env_overrides(
            env::read_non_empty_env(env::EMAIL_ENV),
            env::read_non_empty_env(env::PASSWORD_ENV),
        );
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config = serde_norway::from_str::<Self>(raw)
            .map_err(|err| MultiShotError::Config(format!("config parse failed: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.query_endpoint.trim().is_empty() {
            return Err(MultiShotError::Config(
                "query_endpoint is required".to_string(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(MultiShotError::Config(
                "timeout_ms must be >= 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, email: Option<String>, password: Option<String>) {
        if email.is_some() {
            self.email = email;
        }
        if password.is_some() {
            self.password = password;
        }
    }

    #[must_use]
    pub fn sparql_client_config(&self) -> SparqlClientConfig {
        SparqlClientConfig {
            query_endpoint: self.query_endpoint.trim().to_string(),
            email: env::normalize_non_empty(self.email.as_deref()),
            password: self.password.clone().filter(|value| !value.is_empty()),
            timeout_ms: self.timeout_ms,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_reads_connection_fields_and_ignores_unknown_keys() {
        let raw = "\
query_endpoint: http://localhost:8080/vivo/api/sparqlQuery
update_endpoint: http://localhost:8080/vivo/api/sparqlUpdate
namespace: http://vivo.ufl.edu/individual/
email: vivo_root@example.org
password: hunter2
upload_batch_size: 500
";
        let config = MultiShotConfig::parse(raw).expect("parse");
        assert_eq!(
            config.query_endpoint,
            "http://localhost:8080/vivo/api/sparqlQuery"
        );
        assert_eq!(config.email.as_deref(), Some("vivo_root@example.org"));
        assert_eq!(
            config.namespace.as_deref(),
            Some("http://vivo.ufl.edu/individual/")
        );
        assert_eq!(config.write_mode(), WriteMode::Append);
        assert_eq!(config.output_dir(), PathBuf::from("data_out"));
    }

    #[test]
    fn parse_rejects_missing_query_endpoint() {
        let err = MultiShotConfig::parse("email: a@b.c\n").expect_err("must fail");
        assert!(matches!(err, MultiShotError::Config(_)));
    }

    #[test]
    fn parse_rejects_zero_timeout() {
        let err = MultiShotConfig::parse("query_endpoint: http://x/q\ntimeout_ms: 0\n")
            .expect_err("must fail");
        assert!(matches!(err, MultiShotError::Config(_)));
    }

    #[test]
    fn parse_reads_write_mode_and_output_dir() {
        let config = MultiShotConfig::parse(
            "query_endpoint: http://x/q\nwrite_mode: truncate\noutput_dir: out/corrections\n",
        )
        .expect("parse");
        assert_eq!(config.write_mode(), WriteMode::Truncate);
        assert_eq!(config.output_dir(), PathBuf::from("out/corrections"));
    }

    #[test]
    fn env_overrides_replace_credentials_only_when_present() {
        let mut config = MultiShotConfig::parse(
            "query_endpoint: http://x/q\nemail: file@example.org\npassword: file\n",
        )
        .expect("parse");
        config.apply_env_overrides(None, Some("from-env".to_string()));
        assert_eq!(config.email.as_deref(), Some("file@example.org"));
        assert_eq!(config.password.as_deref(), Some("from-env"));
    }

    #[test]
    fn load_reports_missing_file_as_config_error() {
        let temp = tempdir().expect("tempdir");
        let err = MultiShotConfig::load(&temp.path().join("missing.yaml")).expect_err("must fail");
        assert!(matches!(err, MultiShotError::Config(_)));
        assert_eq!(err.exit_code(), 5);
    }
}
