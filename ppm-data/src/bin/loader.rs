use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ppm_data::PpmLoader;
use ppm_db_sqlite::SqliteRepository;

/// Load PPM baseline records from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - move_id: The move the PPM belongs to
/// - size: S, M or L (may be blank)
/// - weight_estimate: Estimated weight in pounds (may be blank)
/// - planned_move_date: YYYY-MM-DD (may be blank)
/// - pickup_zip / destination_zip: ZIP or ZIP+4 (may be blank)
/// - estimated_incentive: Previously computed incentive (may be blank)
#[derive(Parser, Debug)]
#[command(name = "ppm-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing PPM records
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "moves.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    println!("Loading PPM records from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = PpmLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let inserted = PpmLoader::load(&repo, &records)
        .await
        .context("Failed to load PPM records into database")?;

    println!("Successfully loaded {} PPM records into the database.", inserted);

    Ok(())
}
