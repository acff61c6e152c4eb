// alertfuse/src/main.rs
//
// alertfuse — group security alerts into incidents and replay the
// recommended response.
//
// Usage:
//   alertfuse ingest data/alerts.json
//   alertfuse cluster data/alerts.csv --time-window 15m --min-score 5
//   alertfuse incidents list
//   alertfuse incidents show INC-0001 --explain
//   alertfuse incidents replay INC-0001
//
// Logs go to stderr; stdout carries only the rendered results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use alertfuse::config::{ClusterConfig, DEFAULT_OUTPUT};
use alertfuse::engine::cluster::cluster_with_config;
use alertfuse::ingest::load_alerts;
use alertfuse::report;
use alertfuse::store::IncidentStore;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "alertfuse",
    about   = "Cluster security alerts into incidents with explainable response decisions",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize an alert file and print a sample
    Ingest {
        /// Alert file (.json, .jsonl or .csv)
        path: PathBuf,
    },

    /// Cluster an alert file into incidents and store them
    Cluster {
        /// Alert file (.json, .jsonl or .csv)
        path: PathBuf,

        /// Proximity window, e.g. 15m, 1h, 30s
        #[arg(long, env = "ALERTFUSE_TIME_WINDOW", default_value = "15m")]
        time_window: String,

        /// Minimum score for an alert to join an open incident
        #[arg(long, env = "ALERTFUSE_MIN_SCORE", default_value_t = 5,
              allow_negative_numbers = true)]
        min_score: i64,

        /// Incident document to write
        #[arg(long, env = "ALERTFUSE_OUTPUT", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Inspect stored incidents
    Incidents {
        #[command(subcommand)]
        action: IncidentAction,
    },
}

#[derive(Subcommand)]
enum IncidentAction {
    /// One summary row per stored incident
    List {
        #[arg(long, env = "ALERTFUSE_OUTPUT", default_value = DEFAULT_OUTPUT)]
        path: PathBuf,
    },

    /// Show one incident
    Show {
        incident_id: String,

        /// Include reasoning lines and blast radius
        #[arg(long)]
        explain: bool,

        #[arg(long, env = "ALERTFUSE_OUTPUT", default_value = DEFAULT_OUTPUT)]
        path: PathBuf,
    },

    /// Replay the stored decision for one incident
    Replay {
        incident_id: String,

        #[arg(long, env = "ALERTFUSE_OUTPUT", default_value = DEFAULT_OUTPUT)]
        path: PathBuf,
    },
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("alertfuse=info".parse()?))
        .with_writer(std::io::stderr)
        .compact().init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { path } => {
            let alerts = load_alerts(&path).await?;
            println!("{}", report::alert_sample(&alerts)?);
        }

        Commands::Cluster { path, time_window, min_score, output } => {
            let config = ClusterConfig::parse(&time_window, min_score)?;
            let alerts = load_alerts(&path).await?;
            info!(
                alerts = alerts.len(),
                window_secs = config.time_window.num_seconds(),
                min_score = config.min_score,
                "clustering"
            );

            let incidents = cluster_with_config(alerts, &config);
            let store = IncidentStore::new(output);
            store
                .save(&incidents)
                .await
                .with_context(|| format!("saving incidents to {}", store.path().display()))?;
            print!("{}", report::cluster_table(&incidents));
        }

        Commands::Incidents { action } => match action {
            IncidentAction::List { path } => {
                let incidents = IncidentStore::new(path).load().await?;
                print!("{}", report::incident_list(&incidents));
            }
            IncidentAction::Show { incident_id, explain, path } => {
                let incident = IncidentStore::new(path).find(&incident_id).await?;
                print!("{}", report::show(&incident, explain));
            }
            IncidentAction::Replay { incident_id, path } => {
                let incident = IncidentStore::new(path).find(&incident_id).await?;
                print!("{}", report::replay(&incident));
            }
        },
    }

    Ok(())
}
