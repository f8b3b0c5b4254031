//! Canonical column schema and lenient field coercion.
//!
//! Source rows arrive with arbitrarily-cased field names from CSV exports and
//! the remote table store. This module maps them onto the fixed canonical
//! column set and coerces values leniently: anything that fails numeric or
//! date parsing becomes null rather than an error.

use crate::error::InsightError;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// The fixed set of recognized numeric metric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MetricColumn {
    AiPartcount,
    AvgApparentPower,
    AvgAvail,
    AvgCurrent,
    AvgEnergyConsumption,
    AvgOee,
    AvgPerf,
    AvgQuality,
    AvgReactivePower,
    AvgRealPower,
    AvgTotalEnergy,
    TotalPartCount,
    TotalPartReject,
    TotalRunning,
    TotalOff,
    TotalIdle,
    PowerUnitCost,
}

impl MetricColumn {
    pub const ALL: [MetricColumn; 17] = [
        MetricColumn::AiPartcount,
        MetricColumn::AvgApparentPower,
        MetricColumn::AvgAvail,
        MetricColumn::AvgCurrent,
        MetricColumn::AvgEnergyConsumption,
        MetricColumn::AvgOee,
        MetricColumn::AvgPerf,
        MetricColumn::AvgQuality,
        MetricColumn::AvgReactivePower,
        MetricColumn::AvgRealPower,
        MetricColumn::AvgTotalEnergy,
        MetricColumn::TotalPartCount,
        MetricColumn::TotalPartReject,
        MetricColumn::TotalRunning,
        MetricColumn::TotalOff,
        MetricColumn::TotalIdle,
        MetricColumn::PowerUnitCost,
    ];

    /// Canonical source field name, as it appears in exports.
    pub fn name(&self) -> &'static str {
        match self {
            MetricColumn::AiPartcount => "Ai_partcount",
            MetricColumn::AvgApparentPower => "avg_apparent_power",
            MetricColumn::AvgAvail => "avg_avail",
            MetricColumn::AvgCurrent => "avg_current",
            MetricColumn::AvgEnergyConsumption => "avg_energy_consumption",
            MetricColumn::AvgOee => "avg_oee",
            MetricColumn::AvgPerf => "avg_perf",
            MetricColumn::AvgQuality => "avg_quality",
            MetricColumn::AvgReactivePower => "avg_reactive_power",
            MetricColumn::AvgRealPower => "avg_real_power",
            MetricColumn::AvgTotalEnergy => "avg_total_energy",
            MetricColumn::TotalPartCount => "total_part_count",
            MetricColumn::TotalPartReject => "total_part_reject",
            MetricColumn::TotalRunning => "total_running",
            MetricColumn::TotalOff => "total_off",
            MetricColumn::TotalIdle => "total_idle",
            MetricColumn::PowerUnitCost => "powerUnitCost",
        }
    }

    /// Case-insensitive lookup against the canonical names.
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|col| col.name().to_lowercase() == lowered)
    }
}

pub const DATE_COLUMN: &str = "date";
pub const STATUS_COLUMN: &str = "Machine Status";
pub const MAINTENANCE_COLUMN: &str = "Maintenance Flag";

/// A raw field name resolved onto the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedColumn {
    Date,
    Status,
    Maintenance,
    Metric(MetricColumn),
}

pub fn resolve_column(name: &str) -> Option<ResolvedColumn> {
    let lowered = name.trim().to_lowercase();
    if lowered == DATE_COLUMN {
        return Some(ResolvedColumn::Date);
    }
    if lowered == STATUS_COLUMN.to_lowercase() {
        return Some(ResolvedColumn::Status);
    }
    if lowered == MAINTENANCE_COLUMN.to_lowercase() {
        return Some(ResolvedColumn::Maintenance);
    }
    MetricColumn::from_name(name).map(ResolvedColumn::Metric)
}

/// Coerce a raw JSON value to a float. Non-numeric values become `None`,
/// never an error; booleans coerce to 0/1 so maintenance flags survive.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d",
    "%d-%m-%Y",
];

/// Lenient date parsing across the formats seen in machine exports.
pub fn parse_date(raw: &str) -> Result<NaiveDate, InsightError> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    Err(InsightError::ParseFailure {
        field: DATE_COLUMN.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(
            MetricColumn::from_name("AI_PARTCOUNT"),
            Some(MetricColumn::AiPartcount)
        );
        assert_eq!(
            MetricColumn::from_name("powerunitcost"),
            Some(MetricColumn::PowerUnitCost)
        );
        assert_eq!(MetricColumn::from_name("operator_name"), None);
    }

    #[test]
    fn test_resolve_column() {
        assert_eq!(resolve_column("Date"), Some(ResolvedColumn::Date));
        assert_eq!(resolve_column("machine status"), Some(ResolvedColumn::Status));
        assert_eq!(
            resolve_column("Maintenance Flag"),
            Some(ResolvedColumn::Maintenance)
        );
        assert_eq!(
            resolve_column("avg_oee"),
            Some(ResolvedColumn::Metric(MetricColumn::AvgOee))
        );
        assert_eq!(resolve_column("unknown"), None);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&json!(42.5)), Some(42.5));
        assert_eq!(coerce_numeric(&json!("17")), Some(17.0));
        assert_eq!(coerce_numeric(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(coerce_numeric(&json!(true)), Some(1.0));
        assert_eq!(coerce_numeric(&json!("not a number")), None);
        assert_eq!(coerce_numeric(&json!("")), None);
        assert_eq!(coerce_numeric(&Value::Null), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(parse_date("2024-06-15").unwrap(), expected);
        assert_eq!(parse_date("2024-06-15T08:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024/06/15").unwrap(), expected);
        assert_eq!(parse_date("15-06-2024").unwrap(), expected);
        assert_eq!(parse_date("2024-06-15T08:30:00+05:30").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("").is_err());
    }
}
