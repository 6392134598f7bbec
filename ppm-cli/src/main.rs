use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ppm_cli::app::{self, WeightPage};
use ppm_cli::config::AppConfig;
use ppm_cli::estimator::OfflineEstimator;
use ppm_cli::logging;
use ppm_core::calculations::common::{format_dollars, format_thousands};
use ppm_core::calculations::{is_day_disabled, pack_days, validate_weight_estimate};
use ppm_core::fields::{FieldTable, IncentiveCalculatorForm};
use ppm_core::sync::DisplayState;
use ppm_core::{AuthSession, PpmRepository};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// PPM incentive estimator.
///
/// Loads a move's PPM record, lets you set the weight estimate and shows the
/// incentive for it, keeping the estimate in step with the weight.
#[derive(Debug, Parser)]
#[command(name = "ppm-estimator", version)]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use (overrides the settings file).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string (overrides the settings file).
    /// For SQLite this is a file path (e.g. `moves.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive (overrides the settings file).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Raw `Cookie` header carrying the `user_session` cookie.
    #[arg(long, global = true)]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every PPM in the database.
    List,

    /// Load a PPM, optionally move the weight slider, and show the incentive.
    Estimate {
        /// PPM id.
        #[arg(long)]
        ppm: i64,

        /// Slider positions, in order. The slider is released after the last.
        #[arg(long = "weight")]
        weights: Vec<i64>,

        /// Release the slider after every position, not just the last.
        #[arg(long, default_value_t = false)]
        commit_each: bool,

        /// Save the final weight and incentive back to the PPM.
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// Show which move dates can be picked.
    Dates {
        /// First day of the window (defaults to today).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Check whether this day can be picked.
        #[arg(long)]
        check: Option<NaiveDate>,
    },

    /// Office incentive calculator. Requires a session cookie.
    Calculator {
        #[arg(long)]
        date: String,
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        weight: String,
    },

    /// Check a weight estimate against the member's entitlement.
    Entitlement {
        #[arg(long)]
        weight: i64,
        #[arg(long)]
        entitlement: i64,
    },
}

// ─── output ──────────────────────────────────────────────────────────────────

fn print_display(display: &DisplayState) {
    println!("Weight:    {} lbs", format_thousands(display.display_value));
    match display.incentive {
        Some(incentive) => println!("Incentive: ${}", format_dollars(incentive)),
        None if display.is_loading => println!("Incentive: calculating..."),
        None => println!("Incentive: not available"),
    }
    if let Some(message) = &display.error_message {
        println!("Error:     {message}");
    }
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn list(repo: &dyn PpmRepository) -> Result<()> {
    let ppms = repo.list_ppms().await.context("Failed to list PPMs")?;
    for ppm in ppms {
        println!(
            "{:>4}  {:<12} {:<2} {:>8}  {}",
            ppm.id,
            ppm.move_id,
            ppm.size.map(|s| s.as_str()).unwrap_or("-"),
            ppm.weight_estimate
                .map(|w| format!("{} lbs", format_thousands(w)))
                .unwrap_or_else(|| "-".to_string()),
            ppm.estimated_incentive
                .map(|i| format!("${}", format_dollars(i)))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

async fn estimate(
    repo: &dyn PpmRepository,
    config: &AppConfig,
    ppm: i64,
    weights: &[i64],
    commit_each: bool,
    save: bool,
) -> Result<()> {
    let service = OfflineEstimator::new(config.schedule()).with_latency(config.latency());
    let mut page = WeightPage::new(Arc::new(service));

    page.load(repo, ppm).await;
    let display = page.settle().await;
    print_display(&display);
    anyhow::ensure!(display.is_ready, "PPM {ppm} could not be loaded");

    if let Some((last, earlier)) = weights.split_last() {
        for &weight in earlier {
            page.edit(weight);
            if commit_each {
                page.commit();
            }
        }
        page.edit(*last);
        page.commit();

        let display = page.settle().await;
        println!();
        print_display(&display);
    }

    if save {
        let saved = page.submit(repo).await.context("Failed to save weight estimate")?;
        info!(ppm = saved.id, "saved");
        println!("Saved PPM {}.", saved.id);
    }

    Ok(())
}

fn dates(
    start: NaiveDate,
    check: Option<NaiveDate>,
) {
    let picker = app::move_date_picker(start);
    println!("Window:          {} to {}", picker.min_date, picker.max_date);
    println!("Available days:  {}", picker.available.len());
    if let Some(first) = picker.first_available() {
        println!("First available: {first}");
    }
    if let Some(day) = check {
        let verdict = if is_day_disabled(Some(&picker), day) {
            "unavailable"
        } else {
            "available"
        };
        println!("{day}: {verdict}");
    }
}

async fn calculator(
    session: &AuthSession,
    config: &AppConfig,
    form: IncentiveCalculatorForm,
) -> Result<()> {
    let table = FieldTable::incentive_calculator().context("Failed to build field table")?;
    let service = OfflineEstimator::new(config.schedule());
    let estimate = app::calculate_incentive(session, &table, &form, &service).await?;
    println!("GCC:       ${}", format_dollars(estimate.gcc));
    println!("Incentive: ${}", format_dollars(estimate.incentive));
    Ok(())
}

fn entitlement(
    weight: i64,
    entitlement: i64,
) -> Result<()> {
    validate_weight_estimate(weight, entitlement)?;
    println!(
        "{} lbs is within the {} lbs entitlement ({} pack days).",
        format_thousands(weight),
        format_thousands(entitlement),
        pack_days(entitlement)
    );
    Ok(())
}

async fn open_repository(config: &AppConfig) -> Result<Box<dyn PpmRepository>> {
    let db = &config.database;
    debug!("connecting to {} backend", db.backend);
    let repo = app::build_registry()
        .open(db)
        .await
        .with_context(|| format!("Failed to open database: {}", db.connection_string))?;
    Ok(repo)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(file) = cli.log_file {
        config.logging.file = Some(file);
    }

    logging::init_logging(&config.logging.level);
    if let Some(file) = &config.logging.file {
        logging::enable_file_logging(file)?;
    }

    let session = AuthSession::from_cookie_header(cli.cookie.as_deref().unwrap_or_default());

    match cli.command {
        Command::List => list(&*open_repository(&config).await?).await,
        Command::Estimate {
            ppm,
            weights,
            commit_each,
            save,
        } => {
            let repo = open_repository(&config).await?;
            estimate(&*repo, &config, ppm, &weights, commit_each, save).await
        }
        Command::Dates { start, check } => {
            dates(start.unwrap_or_else(|| Local::now().date_naive()), check);
            Ok(())
        }
        Command::Calculator {
            date,
            origin,
            destination,
            weight,
        } => {
            let form = IncentiveCalculatorForm {
                planned_move_date: date,
                pickup_postal_code: origin,
                destination_postal_code: destination,
                weight,
            };
            calculator(&session, &config, form).await
        }
        Command::Entitlement {
            weight,
            entitlement: limit,
        } => entitlement(weight, limit),
    }
}
