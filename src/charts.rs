//! Seam to the external chart generator.
//!
//! The core does not render charts itself; it supplies the analysis and
//! machine data to a [`ChartGenerator`] and collects the descriptors it
//! gets back. A failing descriptor is skipped and logged, the rest survive,
//! and the list is capped at [`MAX_CHARTS`].

use crate::error::InsightError;
use crate::models::{ChartDescriptor, MachineData, QueryIntent};
use tracing::warn;

pub const MAX_CHARTS: usize = 4;

pub trait ChartGenerator: Send + Sync {
    /// Render charts for one analysis. Items are individually fallible so
    /// one broken chart never takes down the others.
    fn generate(
        &self,
        analysis: &QueryIntent,
        data: &MachineData,
    ) -> Vec<Result<ChartDescriptor, InsightError>>;
}

/// Deployment without a rendering backend: produces no charts.
pub struct NullChartGenerator;

impl ChartGenerator for NullChartGenerator {
    fn generate(
        &self,
        _analysis: &QueryIntent,
        _data: &MachineData,
    ) -> Vec<Result<ChartDescriptor, InsightError>> {
        Vec::new()
    }
}

/// Collect successful descriptors, skipping failures, capped at [`MAX_CHARTS`].
pub fn collect_charts(
    generator: &dyn ChartGenerator,
    analysis: &QueryIntent,
    data: &MachineData,
) -> Vec<ChartDescriptor> {
    generator
        .generate(analysis, data)
        .into_iter()
        .filter_map(|result| match result {
            Ok(chart) => Some(chart),
            Err(err) => {
                warn!(%err, "skipping failed chart");
                None
            }
        })
        .take(MAX_CHARTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator;
    use crate::models::{IntentKind, Table};

    struct FixedCharts(Vec<Result<ChartDescriptor, InsightError>>);

    impl ChartGenerator for FixedCharts {
        fn generate(
            &self,
            _analysis: &QueryIntent,
            _data: &MachineData,
        ) -> Vec<Result<ChartDescriptor, InsightError>> {
            self.0
                .iter()
                .map(|r| match r {
                    Ok(c) => Ok(c.clone()),
                    Err(e) => Err(InsightError::ExportFailure(e.to_string())),
                })
                .collect()
        }
    }

    fn chart(title: &str) -> ChartDescriptor {
        ChartDescriptor {
            kind: "bar".to_string(),
            title: title.to_string(),
            image: String::new(),
            description: String::new(),
        }
    }

    fn machine_data() -> MachineData {
        let table = Table::default();
        MachineData {
            machine: "M1".to_string(),
            files: Vec::new(),
            summary: aggregator::summarize(&table),
            combined: table,
        }
    }

    fn analysis() -> QueryIntent {
        QueryIntent {
            intent: IntentKind::Summary,
            time_period: "all".to_string(),
            metrics: Vec::new(),
            needs_chart: true,
            chart_types: Vec::new(),
            analysis_type: String::new(),
        }
    }

    #[test]
    fn test_cap_at_four() {
        let generator = FixedCharts((0..6).map(|i| Ok(chart(&format!("c{i}")))).collect());
        let charts = collect_charts(&generator, &analysis(), &machine_data());
        assert_eq!(charts.len(), MAX_CHARTS);
    }

    #[test]
    fn test_failing_item_skipped_not_fatal() {
        let generator = FixedCharts(vec![
            Ok(chart("first")),
            Err(InsightError::ExportFailure("render blew up".to_string())),
            Ok(chart("third")),
        ]);
        let charts = collect_charts(&generator, &analysis(), &machine_data());
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].title, "first");
        assert_eq!(charts[1].title, "third");
    }
}
