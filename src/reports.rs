//! Deterministic narrative report templates.
//!
//! The terminal fallback of the response-composition chain. Templates are
//! selected by an ordered keyword table against the lowercased query and
//! interpolate fields from [`MachineSummary`]. Every ratio is guarded with a
//! minimum denominator of 1; this layer never fails.

use crate::models::MachineSummary;

const ENERGY_COST_PER_KWH: f64 = 0.12;

type TemplateFn = fn(&str, &MachineSummary) -> String;

const TEMPLATES: [(&[&str], TemplateFn); 6] = [
    (&["summary", "overview", "report"], comprehensive_report),
    (&["compare", "comparison"], comparison_report),
    (&["quality"], quality_report),
    (&["oee"], oee_report),
    (&["energy"], energy_report),
    (&["cost"], cost_report),
];

/// Compose a narrative for the query from the summary alone. Always
/// succeeds; unmatched queries get the basic report.
pub fn compose(query: &str, machine: &str, summary: &MachineSummary) -> String {
    let lowered = query.to_lowercase();
    for (keywords, template) in TEMPLATES {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return template(machine, summary);
        }
    }
    basic_report(machine, summary)
}

fn min_one(value: f64) -> f64 {
    value.max(1.0)
}

fn comprehensive_report(machine: &str, summary: &MachineSummary) -> String {
    let produced = summary.total_parts_produced;
    let rejected = summary.total_parts_rejected;
    let rejection_pct = rejected / min_one(produced) * 100.0;
    let energy_per_unit = summary.total_energy / min_one(produced);

    let efficiency_rating = oee_rating(summary.average_oee);
    let quality_rating = quality_rating(summary.quality_rate);

    let mut report = format!(
        "**Manufacturing Analytics Report - Machine {machine}**\n\n\
         **Executive Summary:**\n\
         Machine {machine} has processed {} production records showing overall operational performance.\n\n\
         **Production Performance:**\n\
         - Total Parts Produced: {produced:.0} units\n\
         - Parts Rejected: {rejected:.0} units ({rejection_pct:.1}% rejection rate)\n\
         - Quality Rate: {:.1}% ({quality_rating})\n\
         - Net Good Production: {:.0} units\n\n\
         **Operational Efficiency:**\n\
         - Average OEE: {:.1}% ({efficiency_rating})\n\
         - Energy Consumption: {:.1} KwH\n\
         - Energy per Unit: {energy_per_unit:.2} KwH/part\n",
        summary.total_records,
        summary.quality_rate,
        produced - rejected,
        summary.average_oee,
        summary.total_energy,
    );

    let mut recommendations = String::new();
    if summary.average_oee < 75.0 {
        recommendations.push_str(
            "- Priority: Improve OEE through maintenance optimization and downtime reduction\n",
        );
    }
    if summary.quality_rate < 90.0 {
        recommendations.push_str(
            "- Priority: Implement quality control measures to reduce rejection rates\n",
        );
    }
    if energy_per_unit > 1.0 {
        recommendations.push_str(
            "- Consider energy efficiency improvements to reduce power consumption per unit\n",
        );
    }
    if !recommendations.is_empty() {
        report.push_str("\n**Operational Recommendations:**\n");
        report.push_str(&recommendations);
    }

    if let Some(breakdown) = &summary.machine_status_breakdown {
        report.push_str("\n**Machine Status Distribution:**\n");
        for (status, count) in breakdown {
            let percentage = *count as f64 / min_one(summary.total_records as f64) * 100.0;
            report.push_str(&format!(
                "- {status}: {count} records ({percentage:.1}%)\n"
            ));
        }
    }

    if let Some(monthly) = &summary.monthly_breakdown {
        if !monthly.is_empty() {
            report.push_str("\n**Monthly Performance Trends:**\n");
            for (month, totals) in monthly {
                report.push_str(&format!(
                    "- {month}: {:.0} parts, {:.1}% OEE\n",
                    totals.parts_produced, totals.average_oee
                ));
            }
        }
    }

    report.trim_end().to_string()
}

fn comparison_report(machine: &str, summary: &MachineSummary) -> String {
    let Some(monthly) = summary
        .monthly_breakdown
        .as_ref()
        .filter(|monthly| monthly.len() >= 2)
    else {
        // A single period gives nothing to compare against.
        return basic_report(machine, summary);
    };

    let mut report = format!(
        "**Comparative Analysis Report - Machine {machine}**\n\n\
         **Period Comparison Overview:**\n\
         Analyzing performance across {} time periods.\n\n\
         **Production Comparison:**\n",
        monthly.len()
    );

    let mut previous: Option<(&String, &crate::models::MonthlyTotals)> = None;
    for (month, totals) in monthly {
        match previous {
            Some((prev_month, prev)) => {
                let production_change = (totals.parts_produced - prev.parts_produced)
                    / min_one(prev.parts_produced)
                    * 100.0;
                let oee_change = totals.average_oee - prev.average_oee;
                report.push_str(&format!(
                    "- {month}: {:.0} parts ({production_change:+.1}% vs {prev_month}), OEE: {:.1}% ({oee_change:+.1}%)\n",
                    totals.parts_produced, totals.average_oee
                ));
            }
            None => {
                report.push_str(&format!(
                    "- {month}: {:.0} parts, OEE: {:.1}%\n",
                    totals.parts_produced, totals.average_oee
                ));
            }
        }
        previous = Some((month, totals));
    }

    let best = monthly
        .iter()
        .max_by(|a, b| a.1.average_oee.total_cmp(&b.1.average_oee))
        .expect("non-empty breakdown");
    let worst = monthly
        .iter()
        .min_by(|a, b| a.1.average_oee.total_cmp(&b.1.average_oee))
        .expect("non-empty breakdown");
    let spread = best.1.average_oee - worst.1.average_oee;

    report.push_str(&format!(
        "\n**Key Insights:**\n\
         - Best Performance: {} with {:.1}% OEE\n\
         - Lowest Performance: {} with {:.1}% OEE\n\
         - Performance Variation: {spread:.1}% OEE difference\n",
        best.0, best.1.average_oee, worst.0, worst.1.average_oee
    ));

    report.push_str(&format!(
        "\n**Trend Analysis:**\n\
         The data shows {} performance across time periods.",
        if spread < 10.0 { "consistent" } else { "variable" }
    ));

    report
}

fn quality_report(machine: &str, summary: &MachineSummary) -> String {
    format!(
        "**Quality Analysis Report - Machine {machine}**\n\n\
         **Quality Performance Summary:**\n\
         - Total Production: {:.0} parts\n\
         - Rejected Parts: {:.0} parts\n\
         - Quality Rate: {:.2}%\n\
         - Defect Rate: {:.2}%\n\n\
         **Quality Assessment:**\n{}",
        summary.total_parts_produced,
        summary.total_parts_rejected,
        summary.quality_rate,
        100.0 - summary.quality_rate,
        quality_assessment(summary.quality_rate),
    )
}

fn oee_report(machine: &str, summary: &MachineSummary) -> String {
    format!(
        "**Overall Equipment Effectiveness (OEE) Report - Machine {machine}**\n\n\
         **OEE Performance:**\n\
         - Current OEE: {:.1}%\n\
         - Industry Benchmark: 85% (World Class)\n\
         - Performance Gap: {:.1}%\n\n\
         **OEE Analysis:**\n{}",
        summary.average_oee,
        85.0 - summary.average_oee,
        oee_assessment(summary.average_oee),
    )
}

fn energy_report(machine: &str, summary: &MachineSummary) -> String {
    let energy_per_unit = summary.total_energy / min_one(summary.total_parts_produced);
    format!(
        "**Energy Consumption Report - Machine {machine}**\n\n\
         **Energy Usage Summary:**\n\
         - Total Energy Consumed: {:.1} KwH\n\
         - Total Parts Produced: {:.0} units\n\
         - Energy Efficiency: {energy_per_unit:.3} KwH per part\n\
         - Estimated Energy Cost: {:.2} (@ {ENERGY_COST_PER_KWH}/KwH)\n\n\
         **Energy Performance Analysis:**\n{}",
        summary.total_energy,
        summary.total_parts_produced,
        summary.total_energy * ENERGY_COST_PER_KWH,
        energy_assessment(energy_per_unit),
    )
}

fn cost_report(machine: &str, summary: &MachineSummary) -> String {
    let estimated_cost = summary.total_energy * ENERGY_COST_PER_KWH;
    let cost_per_unit = estimated_cost / min_one(summary.total_parts_produced);
    let daily_cost = estimated_cost / min_one(summary.total_records as f64);
    format!(
        "**Production Cost Analysis - Machine {machine}**\n\n\
         **Cost Performance:**\n\
         - Estimated Energy Cost: {estimated_cost:.2}\n\
         - Total Units Produced: {:.0}\n\
         - Cost per Unit: {cost_per_unit:.2}\n\
         - Average Cost per Record: {daily_cost:.2}",
        summary.total_parts_produced,
    )
}

fn basic_report(machine: &str, summary: &MachineSummary) -> String {
    format!(
        "**Manufacturing Summary - Machine {machine}**\n\n\
         **Key Metrics:**\n\
         - Total Production: {:.0} parts\n\
         - Quality Rate: {:.1}%\n\
         - Average OEE: {:.1}%\n\
         - Energy Consumption: {:.1} KwH\n\n\
         **Operational Overview:**\n\
         The machine has {} production records in the selected period.",
        summary.total_parts_produced,
        summary.quality_rate,
        summary.average_oee,
        summary.total_energy,
        summary.total_records,
    )
}

fn quality_rating(rate: f64) -> &'static str {
    if rate >= 95.0 {
        "Excellent"
    } else if rate >= 90.0 {
        "Good"
    } else {
        "Needs Attention"
    }
}

fn oee_rating(oee: f64) -> &'static str {
    if oee >= 85.0 {
        "Excellent"
    } else if oee >= 75.0 {
        "Good"
    } else {
        "Needs Improvement"
    }
}

fn quality_assessment(rate: f64) -> &'static str {
    if rate >= 99.0 {
        "Exceptional quality performance - exceeding industry standards"
    } else if rate >= 95.0 {
        "Excellent quality control - meeting high-performance benchmarks"
    } else if rate >= 90.0 {
        "Good quality performance - within acceptable manufacturing standards"
    } else if rate >= 85.0 {
        "Average quality performance - room for improvement"
    } else {
        "Below standard quality performance - immediate attention required"
    }
}

fn oee_assessment(oee: f64) -> &'static str {
    if oee >= 85.0 {
        "World-class OEE performance - excellent operational efficiency"
    } else if oee >= 75.0 {
        "Good OEE performance - above average manufacturing efficiency"
    } else if oee >= 65.0 {
        "Average OEE performance - typical for manufacturing operations"
    } else {
        "Below average OEE performance - significant improvement opportunities"
    }
}

fn energy_assessment(energy_per_unit: f64) -> &'static str {
    if energy_per_unit < 0.8 {
        "Excellent energy efficiency - well below industry averages"
    } else if energy_per_unit < 1.2 {
        "Good energy performance - within efficient operating range"
    } else if energy_per_unit < 1.8 {
        "Average energy consumption - opportunities for improvement"
    } else {
        "High energy consumption - immediate efficiency improvements needed"
    }
}
