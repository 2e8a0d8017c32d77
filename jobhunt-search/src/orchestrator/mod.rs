//! Aggregation orchestrator: concurrent source fan-out, dedup, truncation.
//!
//! This module fans a query out to every registered source concurrently,
//! isolates their failures, assigns identifiers, deduplicates by canonical
//! URL and truncates to the caller's budget.

pub mod dedup;
pub mod search;
pub mod url_normalize;
