use anyhow::Result;
use clap::{Parser, Subcommand};
use machine_insight::config::Config;
use machine_insight::logging::init_logging;
use machine_insight::models::ResponseKind;
use machine_insight::InsightEngine;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "machine-insight")]
#[command(about = "Manufacturing telemetry aggregation with natural-language queries")]
#[command(version)]
struct Cli {
    /// Path to a config file (otherwise searched in standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a natural-language question about one machine
    Ask {
        /// Machine identifier, e.g. M1 or MC_PRESS_133
        machine: String,
        /// The question, e.g. "quality summary for June 2024"
        query: String,
        /// Output the full response payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the aggregate summary for one machine
    Summary {
        /// Machine identifier
        machine: String,
        /// Optional time reference, e.g. "last month"
        #[arg(long)]
        query: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List available machines
    Machines {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };
    init_logging(&config.logging);

    let engine = InsightEngine::from_config(&config)?;

    match cli.command {
        Commands::Ask { machine, query, json } => {
            let response = engine.chat(&query, &machine).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.response);
                if !response.charts.is_empty() {
                    println!("\n[{} chart(s) generated]", response.charts.len());
                }
            }
            if response.kind == ResponseKind::Error {
                process::exit(1);
            }
        }
        Commands::Summary { machine, query, json } => {
            let summary = engine.machine_summary(&machine, query.as_deref()).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Machine {machine}");
                println!("  Records:        {}", summary.total_records);
                println!("  Parts produced: {:.0}", summary.total_parts_produced);
                println!("  Parts rejected: {:.0}", summary.total_parts_rejected);
                println!("  Quality rate:   {:.2}%", summary.quality_rate);
                println!("  Average OEE:    {:.2}%", summary.average_oee);
                println!("  Total energy:   {:.2} KwH", summary.total_energy);
                if let Some(range) = &summary.date_range {
                    println!(
                        "  Date range:     {} to {} ({} days)",
                        range.start, range.end, range.days
                    );
                }
            }
        }
        Commands::Machines { json } => {
            let machines = engine.machines().await;
            if json {
                println!("{}", serde_json::to_string(&machines)?);
            } else if machines.is_empty() {
                println!("No machines found.");
            } else {
                for machine in machines {
                    println!("{machine}");
                }
            }
        }
    }

    Ok(())
}
