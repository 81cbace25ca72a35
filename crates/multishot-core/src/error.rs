use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MultiShotError>;

#[derive(Debug, Error)]
pub enum MultiShotError {
    #[error("catalog unavailable: {0}")]
    Catalog(String),

    #[error("type resolution failed: {0}")]
    TypeResolution(String),

    #[error("operation lookup failed: {0}")]
    OperationLookup(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    #[error("sparql endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl MultiShotError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "CATALOG_ERROR",
            Self::TypeResolution(_) => "TYPE_RESOLUTION_FAILED",
            Self::OperationLookup(_) => "OPERATION_LOOKUP_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::InvalidSubject(_) => "INVALID_SUBJECT",
            Self::Endpoint { .. } => "ENDPOINT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for a run aborted by this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Catalog(_) => 2,
            Self::TypeResolution(_) => 3,
            Self::OperationLookup(_) => 4,
            Self::Config(_) => 5,
            _ => 1,
        }
    }

    pub fn to_payload(
        &self,
        operation: impl Into<String>,
        run_id: impl Into<String>,
        subject: Option<String>,
    ) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            run_id: run_id.into(),
            subject,
        }
    }
}
