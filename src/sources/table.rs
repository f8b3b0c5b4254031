//! Remote table-store backend.
//!
//! Issues a range filter against the cloud table service and converts the
//! returned entities onto the canonical schema with column pruning. The
//! filter syntax is consumed by deployed table services and must stay
//! bit-exact:
//!
//! `device_name eq '<machine>' and date ge '<YYYY-MM-DD>' and date le '<YYYY-MM-DD>'`

use crate::aggregator;
use crate::config::RemoteTableConfig;
use crate::dates::ResolvedWindow;
use crate::error::InsightError;
use crate::models::{FetchedData, FileSlice};
use crate::normalizer::{self, RawRow, RetentionPolicy};
use crate::sources::DataSource;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub struct TableStore {
    client: reqwest::Client,
    endpoint: String,
    table: String,
    devices_url: String,
    customer_id: String,
}

impl TableStore {
    /// Invalid connection parameters are a programmer error and surface at
    /// startup; everything after construction degrades instead of failing.
    pub fn new(config: &RemoteTableConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            devices_url: config.devices_url.clone(),
            customer_id: config.customer_id.clone(),
        })
    }

    async fn query_entities(&self, filter: &str) -> Result<Vec<RawRow>, InsightError> {
        let url = format!("{}/{}()", self.endpoint, self.table);
        let response = self
            .client
            .get(&url)
            .query(&[("$filter", filter)])
            .header("Accept", "application/json;odata=nometadata")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InsightError::DataUnavailable(format!(
                "table service returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let entities = body
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(entities
            .into_iter()
            .filter_map(|entity| match entity {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

/// The exact range filter the deployed table service expects.
pub fn range_filter(machine: &str, window: Option<&ResolvedWindow>) -> String {
    match window {
        Some(window) => {
            let (start, end) = window.bounds();
            format!(
                "device_name eq '{}' and date ge '{}' and date le '{}'",
                machine,
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )
        }
        None => format!("device_name eq '{}'", machine),
    }
}

#[async_trait]
impl DataSource for TableStore {
    async fn fetch(
        &self,
        machine: &str,
        window: Option<&ResolvedWindow>,
    ) -> Result<FetchedData, InsightError> {
        let filter = range_filter(machine, window);
        debug!(%filter, "querying table store");
        let rows = self.query_entities(&filter).await?;

        if rows.is_empty() {
            info!(%machine, "no table entities matched");
            return Ok(FetchedData::default());
        }

        let combined = normalizer::normalize(&rows, RetentionPolicy::Prune);
        let slice = FileSlice {
            filename: "from_table".to_string(),
            records: combined.len() as u64,
            columns: Vec::new(),
            date_range: aggregator::date_range(&combined),
            summary: aggregator::summarize(&combined),
        };

        Ok(FetchedData {
            files: vec![slice],
            combined,
        })
    }

    async fn list_machines(&self) -> Result<Vec<String>, InsightError> {
        let response = self
            .client
            .post(&self.devices_url)
            .json(&serde_json::json!({ "custID": self.customer_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InsightError::DataUnavailable(format!(
                "device listing returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let machines = body
            .get("devices")
            .and_then(Value::as_array)
            .map(|devices| {
                devices
                    .iter()
                    .filter_map(|d| d.get("device_name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(machines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_filter_is_bit_exact() {
        let window = ResolvedWindow { month: 6, year: 2024 };
        assert_eq!(
            range_filter("MC_PRESS_133", Some(&window)),
            "device_name eq 'MC_PRESS_133' and date ge '2024-06-01' and date le '2024-06-30'"
        );
    }

    #[test]
    fn test_range_filter_leap_february() {
        let window = ResolvedWindow { month: 2, year: 2024 };
        assert_eq!(
            range_filter("M1", Some(&window)),
            "device_name eq 'M1' and date ge '2024-02-01' and date le '2024-02-29'"
        );
    }

    #[test]
    fn test_range_filter_without_window() {
        assert_eq!(range_filter("M7", None), "device_name eq 'M7'");
    }
}
