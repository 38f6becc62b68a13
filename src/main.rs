//! # CSV Ingest CLI (`csv-ingest`)
//!
//! ## Usage
//!
//! ```bash
//! csv-ingest --config ./config/ingest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `csv-ingest serve` | Start the HTTP API |
//! | `csv-ingest init` | Create the warehouse tables |
//! | `csv-ingest check <table> <file>` | Validate a local CSV without uploading it |
//! | `csv-ingest backup <table>` | Unload a table to Parquet |
//! | `csv-ingest restore <location> <table>` | Load a Parquet backup into a table |
//!
//! AWS credentials are read from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
//! and (optionally) `AWS_SESSION_TOKEN`. The warehouse password falls back
//! to `DB_PASSWORD` when it is not set in the config file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use csv_ingest::config::{self, Config};
use csv_ingest::context::IngestContext;
use csv_ingest::models::LoadResult;
use csv_ingest::schema::RecordType;
use csv_ingest::{check, logging, migrate, server};

/// CSV ingestion API for departments, jobs and hired employees.
#[derive(Parser)]
#[command(name = "csv-ingest", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ingest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Create the three tables if they do not exist.
    Init,

    /// Validate a local CSV file offline.
    ///
    /// Chunks and validates the file exactly as an upload would and prints
    /// row counts. Nothing is staged or loaded.
    Check {
        /// `departments`, `jobs` or `hired_employees`.
        table: RecordType,
        /// Path to the `.csv` file.
        file: PathBuf,
    },

    /// Unload a table to Parquet under `backup_<table>/<date>_`.
    Backup {
        table: RecordType,
    },

    /// Load Parquet files from an `s3://bucket/prefix` location.
    Restore {
        location: String,
        table: RecordType,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    // Offline; a missing config file is fine.
    if let Commands::Check { table, file } = &cli.command {
        let cfg = config::load_config(&cli.config).unwrap_or_else(|_| Config::minimal());
        return check::run_check(*table, file, cfg.ingest.chunk_size);
    }

    let cfg = config::load_config(&cli.config)?;
    let ctx = IngestContext::from_config(&cfg)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(Arc::new(ctx)).await?;
        }
        Commands::Init => {
            migrate::run_migrations(&ctx.loader).await?;
            println!("Tables initialized.");
        }
        Commands::Backup { table } => {
            let result = ctx.backups.backup(table).await?;
            print_result(&result)?;
        }
        Commands::Restore { location, table } => {
            let result = ctx.backups.restore(&location, table).await?;
            print_result(&result)?;
        }
        Commands::Check { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn print_result(result: &LoadResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
