// Public fallible APIs in this crate share one concrete error contract (`MultiShotError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod audits;
pub mod catalog;
pub mod config;
pub(crate) mod context;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod models;
pub mod output;
pub mod registry;
pub(crate) mod resolver;
pub mod runner;
pub mod sparql;
pub mod triples;

pub use audits::builtin_registry;
pub use config::MultiShotConfig;
pub use context::RunContext;
pub use error::{MultiShotError, Result};
pub use registry::{Cleaner, CleanerCategory, CleanerRegistry, TripleGenerator};
pub use runner::{AuditPlan, AuditRunner, RunOptions};
pub use sparql::{GraphClient, SparqlClient};
