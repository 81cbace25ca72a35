use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::context::RunContext;
use crate::registry::CLEANER_PREFIX;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// query name -> cleaner name
    pub pairs: BTreeMap<String, String>,
    pub unmatched: Vec<String>,
    /// Queries whose cleaner exists but was left out by a cleaner filter.
    pub filtered: Vec<String>,
}

#[must_use]
pub fn cleaner_name_for(query_name: &str) -> String {
    format!("{CLEANER_PREFIX}{query_name}")
}

/// Pairs each query `X` with the cleaner `clean_X`. Queries without a cleaner
/// are warned about and left out of `pairs`; queries whose cleaner is in
/// `excluded_cleaners` are reported as filtered instead.
pub fn match_queries(
    ctx: &RunContext,
    query_names: &[String],
    cleaner_names: &[String],
    excluded_cleaners: &[String],
) -> MatchReport {
    let cleaners = cleaner_names
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>();
    let excluded = excluded_cleaners
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>();

    let mut report = MatchReport::default();
    for query in query_names {
        let candidate = cleaner_name_for(query);
        if cleaners.contains(candidate.as_str()) {
            report.pairs.insert(query.clone(), candidate);
        } else if excluded.contains(candidate.as_str()) {
            tracing::info!(
                parent: ctx.span(),
                query = %query,
                cleaner = %candidate,
                "cleaner excluded by filter; skipping query"
            );
            report.filtered.push(query.clone());
        } else {
            tracing::warn!(
                parent: ctx.span(),
                query = %query,
                expected_cleaner = %candidate,
                "no matching cleaner for query; skipping"
            );
            report.unmatched.push(query.clone());
        }
    }
    tracing::debug!(
        parent: ctx.span(),
        matched = report.pairs.len(),
        unmatched = report.unmatched.len(),
        filtered = report.filtered.len(),
        "queries matched with cleaners"
    );
    report
}
