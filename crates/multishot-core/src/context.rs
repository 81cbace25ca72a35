use chrono::{Local, NaiveDate};
use tracing::Span;
use uuid::Uuid;

/// Date format used for the per-run output partition.
pub const RUN_DATE_FORMAT: &str = "%Y_%m_%d";

/// Per-run state handed to every component instead of a process-wide logger.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    run_date: NaiveDate,
    span: Span,
}

impl RunContext {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_date(Local::now().date_naive(), quiet)
    }

    /// `quiet` is recorded on the run span; the console layer itself is
    /// chosen when the subscriber is installed.
    #[must_use]
    pub fn with_date(run_date: NaiveDate, quiet: bool) -> Self {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("multishot_run", run_id = %run_id, quiet);
        Self {
            run_id,
            run_date,
            span,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn run_date_label(&self) -> String {
        self.run_date.format(RUN_DATE_FORMAT).to_string()
    }

    /// Parent span for every event emitted during this run.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}
