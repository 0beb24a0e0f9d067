//! cykel-insights CLI - cycle analysis and risk indicators over a journal file

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cykel_insights::history::{default_history_path, RiskHistory};
use cykel_insights::{config, Journal};

#[derive(Parser)]
#[command(name = "cykel-insights", version)]
#[command(about = "Cycle statistics, predictions and health indicators")]
struct Cli {
    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full cycle analysis: statistics, regularity, prediction, phase
    Analyze {
        /// Path to the journal JSON file
        journal: PathBuf,
    },
    /// Predict the next period
    Predict {
        journal: PathBuf,
    },
    /// Fertile window and current fertility status
    Fertility {
        journal: PathBuf,

        /// Include the day-by-day fertility calendar
        #[arg(long)]
        calendar: bool,
    },
    /// Score heuristic risk indicators and track their trend
    Risks {
        journal: PathBuf,

        /// Risk history file (defaults to the local data directory)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Do not append this assessment to the history
        #[arg(long)]
        no_record: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!(app = config::APP_NAME, version = config::APP_VERSION, %today, "starting");

    match cli.command {
        Commands::Analyze { journal } => {
            let journal = load_journal(&journal)?;
            print_json(&journal.analyze(today))?;
        }
        Commands::Predict { journal } => {
            let journal = load_journal(&journal)?;
            print_json(&journal.predict())?;
        }
        Commands::Fertility { journal, calendar } => {
            let journal = load_journal(&journal)?;
            let mut outlook = journal.fertility(today);
            if !calendar {
                if let Some(outlook) = outlook.as_mut() {
                    outlook.calendar.clear();
                }
            }
            print_json(&outlook)?;
        }
        Commands::Risks {
            journal,
            history,
            no_record,
        } => {
            let journal = load_journal(&journal)?;
            let history_path = match history {
                Some(path) => path,
                None => default_history_path().context("Failed to locate risk history")?,
            };

            let mut history = RiskHistory::load(&history_path).with_context(|| {
                format!("Failed to read risk history {}", history_path.display())
            })?;
            let assessment = journal.assess(today, &history);

            if !no_record {
                history.record(&assessment, today);
                history.save(&history_path).with_context(|| {
                    format!("Failed to write risk history {}", history_path.display())
                })?;
                tracing::info!(path = %history_path.display(), "recorded assessment");
            }

            print_json(&assessment)?;
        }
    }

    Ok(())
}

fn load_journal(path: &Path) -> anyhow::Result<Journal> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal {}", path.display()))?;
    let journal = Journal::from_json(&json)
        .with_context(|| format!("Invalid journal {}", path.display()))?;
    tracing::info!(
        cycles = journal.cycles.len(),
        symptoms = journal.symptoms.len(),
        "loaded journal"
    );
    Ok(journal)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
