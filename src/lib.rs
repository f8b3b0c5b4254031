//! Machine Insight Library
//!
//! Aggregates per-machine manufacturing telemetry (CSV exports or rows from
//! a remote table store) and answers natural-language questions about it.
//!
//! ## Pipeline
//!
//! A query and a machine identifier enter, and the data flows through:
//!
//! 1. [`dates`] - resolves the query's free-text time reference into a
//!    concrete calendar-month window, with deterministic defaults
//! 2. [`sources`] - fetches matching raw rows from the configured backend
//!    (local CSV directories or a remote tabular store)
//! 3. [`normalizer`] / [`schema`] - maps raw fields onto the canonical
//!    column set, coercing leniently and dropping all-null rows
//! 4. [`aggregator`] - computes the per-machine [`models::MachineSummary`]
//!    (production totals, quality rate, OEE, energy, breakdowns)
//! 5. [`inference`] / [`intent`] - classifies the query and composes a
//!    narrative, degrading from the external model to local fallbacks to
//!    deterministic rules
//! 6. [`charts`] - hands the analysis to the external chart generator and
//!    collects back up to four descriptors
//!
//! [`engine::InsightEngine`] orchestrates the whole request and always
//! returns a well-formed response; internal failures degrade to empty
//! results with a log entry, never an error to the caller.
//!
//! ## Failure posture
//!
//! The core is a best-effort aggregator for operational dashboards: no
//! exactly-once ingestion, no transactional consistency. See
//! [`error::InsightError`] for the degradation taxonomy.

pub mod aggregator;
pub mod charts;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod inference;
pub mod intent;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod reports;
pub mod schema;
pub mod sources;

pub use engine::InsightEngine;
pub use models::*;
