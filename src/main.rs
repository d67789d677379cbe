// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use threat_triage::{
    seed_store, Collection, DashboardStats, Ingestor, Report, Severity, TriageConfig,
    TriageStatus, TriageStore,
};

const LOG_FILE: &str = "threat-triage.log";

#[derive(Parser, Debug)]
#[command(name = "threat-triage")]
#[command(about = "Threat/entity triage dashboard", long_about = None)]
struct Cli {
    /// Path to config file (defaults to $TRIAGE_CONFIG or ./triage.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard (default)
    Tui,

    /// Run the ingest feed headless and export a report
    Simulate {
        /// Number of entities to ingest before stopping
        #[arg(long, default_value_t = 10)]
        ticks: usize,

        /// Override the configured ingest interval
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Triage everything by severity band and submit a batch
        #[arg(long)]
        submit: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            init_file_logging()?;
            let config = load_config(cli.config)?;
            run_ui_mode(config).await
        }
        Command::Simulate {
            ticks,
            interval_ms,
            submit,
        } => {
            init_stderr_logging();
            let mut config = load_config(cli.config)?;
            if let Some(ms) = interval_ms {
                config.ingest_interval_ms = ms;
                config.validate().context("Invalid --interval-ms")?;
            }
            run_simulation(config, ticks, submit).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The dashboard owns the terminal, so logs go to a file
fn init_file_logging() -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("Failed to open log file: {}", LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<TriageConfig> {
    TriageConfig::load(path.as_deref()).context("Failed to load configuration")
}

async fn run_simulation(config: TriageConfig, ticks: usize, submit: bool) -> Result<()> {
    println!("📡 Threat Triage - Headless Ingest");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut store = seed_store(&config);
    println!("✓ Seeded {} entities", store.collection(Collection::Unreviewed).len());

    let mut ingestor = Ingestor::from_config(&config);
    ingestor.start();
    println!(
        "\n⏱️  Ingesting {} entities every {} ms...",
        ticks, config.ingest_interval_ms
    );

    let mut ingested = 0;
    while ingested < ticks {
        tokio::time::sleep(ingestor.period()).await;
        for entity in ingestor.drain() {
            if ingested == ticks {
                break;
            }
            println!("   + {} (risk {})", entity.name, entity.risk_score);
            store = store.ingest(entity);
            ingested += 1;
        }
    }
    ingestor.stop();
    println!("✓ Ingested {} entities", ingested);

    if submit {
        store = triage_by_severity(store).submit_batch();
        println!("✓ Batch submitted");
    }

    let stats = DashboardStats::from_store(&store);
    println!("\n📊 Working set: {} entities (avg risk {})", stats.total, stats.average_risk);
    println!(
        "   Unreviewed {} | Flagged {} | Priority {} | Deleted {} | Submitted {}",
        stats.unreviewed, stats.flagged, stats.priority, stats.deleted, stats.submitted
    );

    let report = Report::from_store(&store, Utc::now());
    let path = report
        .write_to_dir(&config.report_dir)
        .context("Failed to export report")?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Report written to {}", path.display());

    Ok(())
}

/// Route every Unreviewed entity by band: Critical → Priority,
/// Signal → Flagged, Noise → Deleted.
fn triage_by_severity(store: TriageStore) -> TriageStore {
    let decisions: Vec<(String, TriageStatus)> = store
        .collection(Collection::Unreviewed)
        .iter()
        .map(|entity| {
            let target = match entity.severity() {
                Severity::Critical => TriageStatus::Priority,
                Severity::Signal => TriageStatus::Flagged,
                Severity::Noise => TriageStatus::Deleted,
            };
            (entity.id.clone(), target)
        })
        .collect();

    decisions
        .into_iter()
        .fold(store, |store, (id, target)| store.transition(&id, target))
}

#[cfg(feature = "tui")]
async fn run_ui_mode(config: TriageConfig) -> Result<()> {
    let store = seed_store(&config);
    let ingestor = Ingestor::from_config(&config);

    let mut app = ui::App::new(store, ingestor, config.report_dir.clone());
    ui::run_ui(&mut app).await?;

    println!("\n✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_ui_mode(_config: TriageConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run headless: threat-triage simulate --ticks 10");
    std::process::exit(1);
}
