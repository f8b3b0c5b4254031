//! Request orchestration.
//!
//! One chat request flows: resolve the query's date window, fetch matching
//! rows from the configured data source, normalize and summarize, classify
//! the query, compose a narrative, and optionally collect charts. Every
//! stage degrades instead of failing, so the engine always hands the front
//! end a well-formed [`ChatResponse`].

use crate::aggregator;
use crate::charts::{self, ChartGenerator, NullChartGenerator};
use crate::config::Config;
use crate::dates;
use crate::inference::InferenceClient;
use crate::models::{ChatResponse, MachineData, MachineSummary, ResponseKind};
use crate::sources::{files::FileStore, table::TableStore, DataSource};
use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

pub struct InsightEngine {
    source: Box<dyn DataSource>,
    inference: InferenceClient,
    charts: Box<dyn ChartGenerator>,
}

impl InsightEngine {
    pub fn new(
        source: Box<dyn DataSource>,
        inference: InferenceClient,
        charts: Box<dyn ChartGenerator>,
    ) -> Self {
        Self {
            source,
            inference,
            charts,
        }
    }

    /// Build an engine from deployment configuration. Backend selection is
    /// the only construction-time decision; an invalid configuration is a
    /// startup error, not a per-request one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source: Box<dyn DataSource> = match config.sources.backend.as_str() {
            "table" => Box::new(TableStore::new(&config.remote_table)?),
            _ => Box::new(FileStore::new(&config.sources)),
        };
        Ok(Self::new(
            source,
            InferenceClient::new(&config.inference),
            Box::new(NullChartGenerator),
        ))
    }

    /// Answer one natural-language query about one machine.
    pub async fn chat(&self, query: &str, machine: &str) -> ChatResponse {
        let query = query.trim();
        let machine = machine.trim();
        if query.is_empty() {
            return ChatResponse::error("No query provided");
        }
        if machine.is_empty() {
            return ChatResponse::error("No machine selected");
        }

        let window = dates::resolve(query, Utc::now().date_naive());
        info!(%machine, month = window.month, year = window.year, "resolved query window");

        let data = self.load_machine_data(machine, &window).await;
        if data.combined.is_empty() {
            return ChatResponse::error(format!(
                "No data found for machine {machine}. Please check that the machine has telemetry for the requested period."
            ));
        }

        let analysis = self.inference.classify(query, machine, &data).await;
        let response = self.inference.compose(query, machine, &data, &analysis).await;

        let chart_list = if analysis.needs_chart {
            charts::collect_charts(self.charts.as_ref(), &analysis, &data)
        } else {
            Vec::new()
        };

        ChatResponse {
            response,
            kind: ResponseKind::Success,
            analysis: Some(analysis),
            charts: chart_list,
        }
    }

    /// Fresh per-machine summary for the window the query implies.
    pub async fn machine_summary(&self, machine: &str, query: Option<&str>) -> MachineSummary {
        let window = query.map(|q| dates::resolve(q, Utc::now().date_naive()));
        match self.source.fetch(machine, window.as_ref()).await {
            Ok(fetched) => aggregator::summarize(&fetched.combined),
            Err(err) => {
                warn!(%machine, %err, "summary fetch failed, returning empty summary");
                MachineSummary::default()
            }
        }
    }

    /// Machines the configured source knows about. Unreachable sources
    /// yield an empty list, never an error.
    pub async fn machines(&self) -> Vec<String> {
        match self.source.list_machines().await {
            Ok(machines) => machines,
            Err(err) => {
                warn!(%err, "machine listing failed");
                Vec::new()
            }
        }
    }

    async fn load_machine_data(
        &self,
        machine: &str,
        window: &dates::ResolvedWindow,
    ) -> MachineData {
        let fetched = match self.source.fetch(machine, Some(window)).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(%machine, %err, "data source unavailable");
                Default::default()
            }
        };
        MachineData {
            machine: machine.to_string(),
            files: fetched.files,
            summary: aggregator::summarize(&fetched.combined),
            combined: fetched.combined,
        }
    }
}
