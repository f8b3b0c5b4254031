//! Core Data Models
//!
//! Data structures for the machine telemetry pipeline, in the order the data
//! flows through them:
//!
//! 1. **Normalized rows**: [`Record`] / [`Table`] - cleaned observations
//!    restricted to the canonical column set
//! 2. **Aggregation**: [`MachineSummary`] - per-machine aggregate metrics
//!    with optional status, maintenance, and monthly breakdowns
//! 3. **Classification**: [`QueryIntent`] - structured result of classifying
//!    a natural-language query
//! 4. **Output**: [`ChatResponse`] - the payload handed back to the front end
//!
//! Summaries are pure functions of their table and are serialized directly
//! into response payloads, so every aggregate field is a plain scalar or a
//! plain map, never a wrapped container type.

use crate::schema::MetricColumn;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Which canonical columns a table actually carries. Columns missing from a
/// source are absent, not null-filled, and downstream code probes for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnId {
    Date,
    Status,
    Maintenance,
    Metric(MetricColumn),
}

/// One normalized observation row. A missing or unparseable timestamp is
/// kept as `None`, not discarded; metric values that failed coercion are
/// simply absent from `metrics`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub maintenance: Option<f64>,
    pub metrics: HashMap<MetricColumn, f64>,
}

impl Record {
    pub fn is_all_null(&self) -> bool {
        self.date.is_none()
            && self.status.is_none()
            && self.maintenance.is_none()
            && self.metrics.is_empty()
    }
}

/// An ordered sequence of normalized records plus the set of canonical
/// columns present in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: BTreeSet<ColumnId>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: ColumnId) -> bool {
        self.columns.contains(&column)
    }

    /// Non-null values of one metric column, in row order.
    pub fn metric_values(&self, column: MetricColumn) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.metrics.get(&column).copied())
    }

    pub fn metric_sum(&self, column: MetricColumn) -> f64 {
        self.metric_values(column).sum()
    }

    pub fn metric_mean(&self, column: MetricColumn) -> f64 {
        let values: Vec<f64> = self.metric_values(column).collect();
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Concatenate another table into this one. The column set is the schema
    /// union; columns present in only one source stay absent for the other's
    /// rows.
    pub fn merge(&mut self, other: Table) {
        self.columns.extend(other.columns);
        self.rows.extend(other.rows);
    }
}

/// Observed date span of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u64,
}

/// Per-calendar-month aggregates: sums for counters, mean for OEE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub parts_produced: f64,
    pub average_oee: f64,
    pub total_energy: f64,
}

/// Aggregate metrics for one machine over one fetched table.
///
/// `quality_rate` is exactly `(produced - rejected) / produced * 100` when
/// produced > 0 and exactly 0 otherwise; it never divides by zero. The
/// optional breakdowns appear only when their source column was present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MachineSummary {
    pub total_records: u64,
    pub total_parts_produced: f64,
    pub total_parts_rejected: f64,
    pub average_oee: f64,
    pub total_energy: f64,
    pub quality_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_status_breakdown: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_events: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_breakdown: Option<BTreeMap<String, MonthlyTotals>>,
}

/// Metadata for one CSV file under a machine directory.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub modified: Option<String>,
    /// Parsed from `<month>_<year>` filenames when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_year: Option<(u32, i32)>,
}

/// One loaded slice of machine data: a single CSV file, or the single
/// result set of a remote table query.
#[derive(Debug, Clone, Serialize)]
pub struct FileSlice {
    pub filename: String,
    pub records: u64,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub summary: MachineSummary,
}

/// What a data source hands back: the combined normalized table plus the
/// per-slice bookkeeping the narrative and chart layers consume.
#[derive(Debug, Clone, Default)]
pub struct FetchedData {
    pub files: Vec<FileSlice>,
    pub combined: Table,
}

/// Everything known about one machine for one request.
#[derive(Debug, Clone)]
pub struct MachineData {
    pub machine: String,
    pub files: Vec<FileSlice>,
    pub combined: Table,
    pub summary: MachineSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Summary,
    Comparison,
    Trend,
    SpecificMetric,
    Report,
}

/// Structured result of classifying a natural-language query. Produced once
/// per query and immutable after creation; consumed by both the narrative
/// composer and the chart generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub intent: IntentKind,
    #[serde(default)]
    pub time_period: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub needs_chart: bool,
    #[serde(default)]
    pub chart_types: Vec<String>,
    #[serde(default)]
    pub analysis_type: String,
}

/// One rendered chart handed back from the chart generator.
#[derive(Debug, Clone, Serialize)]
pub struct ChartDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    /// Base64-encoded raster image.
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Success,
    Error,
}

/// The payload returned to the front end for one chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<QueryIntent>,
    pub charts: Vec<ChartDescriptor>,
}

impl ChatResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: message.into(),
            kind: ResponseKind::Error,
            analysis: None,
            charts: Vec::new(),
        }
    }
}
