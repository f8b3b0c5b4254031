//! Schema normalization: raw source rows in, clean [`Table`] out.
//!
//! A pure transform with no failure mode: unparseable dates and non-numeric
//! metric values degrade to null, unknown fields are handled per the
//! retention policy, and rows that are null across every column are dropped.

use crate::models::{ColumnId, Record, Table};
use crate::schema::{self, ResolvedColumn};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

pub type RawRow = Map<String, Value>;

/// Which columns survive normalization. One policy is applied consistently
/// per data-source type: the remote table store prunes down to date plus
/// metrics, file ingestion retains the status and maintenance columns too,
/// since the summary code probes for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep only the date and numeric metric columns.
    Prune,
    /// Keep every canonical column present in the source.
    RetainAll,
}

impl RetentionPolicy {
    fn keeps(&self, column: ResolvedColumn) -> bool {
        match self {
            RetentionPolicy::RetainAll => true,
            RetentionPolicy::Prune => matches!(
                column,
                ResolvedColumn::Date | ResolvedColumn::Metric(_)
            ),
        }
    }
}

/// Normalize raw rows onto the canonical schema.
///
/// Only canonical columns present in the input appear in the output column
/// set; others are absent, not null-filled.
pub fn normalize(rows: &[RawRow], policy: RetentionPolicy) -> Table {
    let mut columns = BTreeSet::new();
    let mut normalized = Vec::with_capacity(rows.len());

    for raw in rows {
        let mut record = Record::default();
        for (name, value) in raw {
            let Some(resolved) = schema::resolve_column(name) else {
                continue;
            };
            if !policy.keeps(resolved) {
                continue;
            }
            match resolved {
                ResolvedColumn::Date => {
                    columns.insert(ColumnId::Date);
                    record.date = match value {
                        Value::String(s) => match schema::parse_date(s) {
                            Ok(date) => Some(date),
                            Err(err) => {
                                trace!(%err, "date degraded to null");
                                None
                            }
                        },
                        _ => None,
                    };
                }
                ResolvedColumn::Status => {
                    columns.insert(ColumnId::Status);
                    record.status = value
                        .as_str()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                }
                ResolvedColumn::Maintenance => {
                    columns.insert(ColumnId::Maintenance);
                    record.maintenance = schema::coerce_numeric(value);
                }
                ResolvedColumn::Metric(metric) => {
                    columns.insert(ColumnId::Metric(metric));
                    if let Some(number) = schema::coerce_numeric(value) {
                        record.metrics.insert(metric, number);
                    }
                }
            }
        }
        if !record.is_all_null() {
            normalized.push(record);
        }
    }

    Table {
        columns,
        rows: normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MetricColumn;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_null_row_dropped() {
        let rows = vec![
            row(&[("date", json!("")), ("avg_oee", json!("n/a"))]),
            row(&[("date", json!("2024-06-01")), ("avg_oee", json!(""))]),
        ];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        assert_eq!(table.len(), 1);
        assert!(table.rows[0].date.is_some());
    }

    #[test]
    fn test_single_non_null_field_retained() {
        let rows = vec![row(&[
            ("date", json!("not a date")),
            ("Ai_partcount", json!("120")),
        ])];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.rows[0].metrics.get(&MetricColumn::AiPartcount),
            Some(&120.0)
        );
        assert!(table.rows[0].date.is_none());
    }

    #[test]
    fn test_prune_drops_status_and_maintenance() {
        let rows = vec![row(&[
            ("date", json!("2024-06-01")),
            ("Machine Status", json!("Running")),
            ("Maintenance Flag", json!(1)),
            ("avg_oee", json!(81.5)),
        ])];
        let table = normalize(&rows, RetentionPolicy::Prune);
        assert!(!table.has_column(ColumnId::Status));
        assert!(!table.has_column(ColumnId::Maintenance));
        assert!(table.has_column(ColumnId::Metric(MetricColumn::AvgOee)));
        assert!(table.rows[0].status.is_none());
    }

    #[test]
    fn test_retain_keeps_status_and_maintenance() {
        let rows = vec![row(&[
            ("date", json!("2024-06-01")),
            ("machine status", json!("Idle")),
            ("Maintenance Flag", json!(true)),
        ])];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        assert!(table.has_column(ColumnId::Status));
        assert_eq!(table.rows[0].status.as_deref(), Some("Idle"));
        assert_eq!(table.rows[0].maintenance, Some(1.0));
    }

    #[test]
    fn test_absent_columns_stay_absent() {
        let rows = vec![row(&[("avg_oee", json!(75.0))])];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        assert!(!table.has_column(ColumnId::Date));
        assert!(!table.has_column(ColumnId::Metric(MetricColumn::AiPartcount)));
    }

    #[test]
    fn test_non_numeric_metric_becomes_null() {
        let rows = vec![row(&[
            ("avg_oee", json!("bad")),
            ("Ai_partcount", json!(10)),
        ])];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        // Column is present in source, value degraded to null for the row.
        assert!(table.has_column(ColumnId::Metric(MetricColumn::AvgOee)));
        assert!(table.rows[0].metrics.get(&MetricColumn::AvgOee).is_none());
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let rows = vec![row(&[
            ("Operator Name", json!("R. Patel")),
            ("avg_oee", json!(70.0)),
        ])];
        let table = normalize(&rows, RetentionPolicy::RetainAll);
        assert_eq!(table.columns.len(), 1);
    }
}
