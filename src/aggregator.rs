//! Per-machine summary statistics over a normalized table.
//!
//! `summarize` is a pure function: the same table always yields the same
//! [`MachineSummary`], and nothing is mutated in place. Absent columns
//! contribute zeros or omitted breakdowns, never errors.

use crate::models::{ColumnId, DateRange, MachineSummary, MonthlyTotals, Table};
use crate::schema::MetricColumn;
use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet};

pub fn summarize(table: &Table) -> MachineSummary {
    let produced = table.metric_sum(MetricColumn::AiPartcount);
    let rejected = table.metric_sum(MetricColumn::TotalPartReject);

    // Defined as exactly 0 when nothing was produced; never divides by zero.
    let quality_rate = if produced > 0.0 {
        (produced - rejected) / produced * 100.0
    } else {
        0.0
    };

    MachineSummary {
        total_records: table.len() as u64,
        total_parts_produced: produced,
        total_parts_rejected: rejected,
        average_oee: table.metric_mean(MetricColumn::AvgOee),
        total_energy: table.metric_sum(MetricColumn::AvgTotalEnergy),
        quality_rate,
        machine_status_breakdown: status_breakdown(table),
        maintenance_events: maintenance_events(table),
        date_range: date_range(table),
        monthly_breakdown: monthly_breakdown(table),
    }
}

fn status_breakdown(table: &Table) -> Option<BTreeMap<String, u64>> {
    if !table.has_column(ColumnId::Status) {
        return None;
    }
    let mut counts = BTreeMap::new();
    for status in table.rows.iter().filter_map(|row| row.status.as_deref()) {
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }
    Some(counts)
}

fn maintenance_events(table: &Table) -> Option<u64> {
    if !table.has_column(ColumnId::Maintenance) {
        return None;
    }
    let events = table
        .rows
        .iter()
        .filter_map(|row| row.maintenance)
        .filter(|flag| *flag != 0.0)
        .count() as u64;
    Some(events)
}

/// Date span over rows with a non-null date, counting distinct days.
pub fn date_range(table: &Table) -> Option<DateRange> {
    if !table.has_column(ColumnId::Date) {
        return None;
    }
    let days: BTreeSet<_> = table.rows.iter().filter_map(|row| row.date).collect();
    let start = *days.first()?;
    let end = *days.last()?;
    Some(DateRange {
        start,
        end,
        days: days.len() as u64,
    })
}

/// Group dated rows by calendar month, keyed `YYYY-MM`. Counters are summed,
/// OEE is averaged per month. Rows with a null date are excluded.
fn monthly_breakdown(table: &Table) -> Option<BTreeMap<String, MonthlyTotals>> {
    if !table.has_column(ColumnId::Date) {
        return None;
    }

    struct MonthAccumulator {
        parts: f64,
        oee_sum: f64,
        oee_count: u64,
        energy: f64,
    }

    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
    for row in &table.rows {
        let Some(date) = row.date else { continue };
        let key = format!("{:04}-{:02}", date.year(), date.month());
        let entry = months.entry(key).or_insert(MonthAccumulator {
            parts: 0.0,
            oee_sum: 0.0,
            oee_count: 0,
            energy: 0.0,
        });
        if let Some(parts) = row.metrics.get(&MetricColumn::AiPartcount) {
            entry.parts += parts;
        }
        if let Some(oee) = row.metrics.get(&MetricColumn::AvgOee) {
            entry.oee_sum += oee;
            entry.oee_count += 1;
        }
        if let Some(energy) = row.metrics.get(&MetricColumn::AvgTotalEnergy) {
            entry.energy += energy;
        }
    }

    if months.is_empty() {
        return None;
    }

    Some(
        months
            .into_iter()
            .map(|(key, acc)| {
                let average_oee = if acc.oee_count > 0 {
                    acc.oee_sum / acc.oee_count as f64
                } else {
                    0.0
                };
                (
                    key,
                    MonthlyTotals {
                        parts_produced: acc.parts,
                        average_oee,
                        total_energy: acc.energy,
                    },
                )
            })
            .collect(),
    )
}
