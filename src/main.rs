use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use adaptrs::config::AppConfig;
use adaptrs::daily_state::DailyStateUpdater;
use adaptrs::database::Database;
use adaptrs::delta::DeltaCalculator;
use adaptrs::logging::{self, LogLevel};
use adaptrs::models::{MetabolicProfile, TodaysWorkout};
use adaptrs::zones::Zone;

/// adaptrs - adaptive training state engine
///
/// Compares planned workouts against performed activities and adapts
/// tomorrow's training-load ceiling, intensity zone and caloric targets
/// from the accumulated variance.
#[derive(Parser)]
#[command(name = "adaptrs")]
#[command(version = "0.1.0")]
#[command(about = "Plan-vs-actual variance and daily adaptation engine", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database path (overrides the configured one)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute plan-vs-actual deltas over a date range
    Delta {
        /// Athlete ID
        #[arg(short, long)]
        athlete: Option<String>,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Print every delta instead of only the weekly summary
        #[arg(long)]
        full: bool,
    },

    /// Compute (and optionally persist) the adapted daily state
    DailyState {
        /// Athlete ID
        #[arg(short, long)]
        athlete: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Trailing history window in days
        #[arg(long, default_value_t = 21)]
        window: i64,

        /// Daily caloric target of the metabolic profile, kcal
        #[arg(long)]
        daily_kcal: Option<f64>,

        /// Basal metabolic rate of the metabolic profile, kcal
        #[arg(long)]
        bmr: Option<f64>,

        /// Today's planned zone label (z1..z7 or an alias)
        #[arg(long)]
        planned_zone: Option<String>,

        /// Today's planned TSS
        #[arg(long)]
        planned_tss: Option<f64>,

        /// Persist the state into the rolling window
        #[arg(long)]
        save: bool,
    },

    /// Show a persisted daily state
    Show {
        /// Athlete ID
        #[arg(short, long)]
        athlete: Option<String>,

        /// State date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;

    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    logging::init_logging(&config.logging)?;

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data dir {}", parent.display()))?;
    }
    let mut db = Database::new(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    match cli.command {
        Commands::Delta {
            athlete,
            from,
            to,
            full,
        } => {
            let athlete = resolve_athlete(athlete, &config)?;
            let deltas = DeltaCalculator::calculate_deltas_for_date_range(&db, &athlete, from, to);
            let summary = DeltaCalculator::calculate_weekly_summary(&deltas);

            if full {
                println!("{}", serde_json::to_string_pretty(&deltas)?);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::DailyState {
            athlete,
            date,
            window,
            daily_kcal,
            bmr,
            planned_zone,
            planned_tss,
            save,
        } => {
            let athlete = resolve_athlete(athlete, &config)?;

            let start = date - Duration::days(window);
            let end = date - Duration::days(1);
            let deltas = DeltaCalculator::calculate_deltas_for_date_range(&db, &athlete, start, end);

            let profile = daily_kcal.map(|daily_kcal| MetabolicProfile {
                bmr: bmr.unwrap_or(daily_kcal * 0.65),
                daily_kcal,
            });
            let planned_today = planned_tss.map(|tss| TodaysWorkout {
                zone: planned_zone
                    .as_deref()
                    .map_or(Zone::Z2, Zone::from_label),
                tss,
            });

            let state = DailyStateUpdater::calculate_daily_state(
                &athlete,
                date,
                &deltas,
                profile.as_ref(),
                planned_today.as_ref(),
            );

            if save && !db.save_daily_state(&state) {
                anyhow::bail!("daily state for {date} was not persisted");
            }
            println!("{}", serde_json::to_string_pretty(&state)?);
        }

        Commands::Show { athlete, date } => {
            let athlete = resolve_athlete(athlete, &config)?;
            match db.load_daily_state(&athlete, date) {
                Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                None => println!("No daily state stored for {athlete} on {date}"),
            }
        }
    }

    Ok(())
}

fn resolve_athlete(cli_athlete: Option<String>, config: &AppConfig) -> Result<String> {
    cli_athlete
        .or_else(|| config.settings.default_athlete_id.clone())
        .context("no athlete given; pass --athlete or set default_athlete_id in the config")
}
