//! CLI for the legacy migration pipeline.
//!
//! Each step is independently runnable so an operator can audit, create
//! the schema, transfer, and restore accounts as separate invocations.
//! Structural failures exit non-zero; row-count mismatches and nulled
//! values are reported but never change the exit code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use migrate_core::config::Config;
use migrate_core::legacy::LegacyDatabase;
use migrate_core::manifest::migration_manifest;
use migrate_core::{accounts, audit, schema, transfer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Legacy desktop database -> PostgreSQL migration pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Census the legacy values slated for conversion (read-only)
    Audit,

    /// Drop and recreate the destination schema
    CreateSchema,

    /// Transfer every legacy table into the destination schema
    Transfer,

    /// Snapshot the users table to a timestamped JSON file
    BackupAccounts,

    /// Restore users from the most recent snapshot
    RestoreAccounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,migrate_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Audit => cmd_audit(&config),
        Commands::CreateSchema => cmd_create_schema(&config).await,
        Commands::Transfer => cmd_transfer(&config).await,
        Commands::BackupAccounts => cmd_backup_accounts(&config).await,
        Commands::RestoreAccounts => cmd_restore_accounts(&config).await,
    }
}

async fn get_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to destination database")
}

fn open_legacy(config: &Config) -> Result<LegacyDatabase> {
    let path = config.require_legacy_db_path()?;
    LegacyDatabase::open(path, &config.mdb_export_bin, &config.mdb_tables_bin)
        .context("Failed to open legacy database")
}

fn cmd_audit(config: &Config) -> Result<()> {
    let db = open_legacy(config)?;
    let manifest = migration_manifest();

    println!("{}", "== Legacy data audit ==".bold());
    let report = audit::run_audit(&db, &manifest).context("Audit failed")?;
    print!("{}", report.render());
    println!(
        "{}",
        "Audit is advisory; nothing was written.".dimmed()
    );
    Ok(())
}

async fn cmd_create_schema(config: &Config) -> Result<()> {
    let pool = get_pool(config).await?;
    schema::create_schema(&pool).await?;
    println!("{}", "Destination schema recreated.".green());
    Ok(())
}

async fn cmd_transfer(config: &Config) -> Result<()> {
    let db = open_legacy(config)?;
    let pool = get_pool(config).await?;
    let manifest = migration_manifest();

    let report = transfer::run_transfer(&db, &pool, &manifest).await?;
    print!("{}", report.render());

    if report.all_counts_match() {
        println!("{}", "Row counts match the legacy source.".green());
    } else {
        // Reported, not fatal: the operator decides whether to accept.
        println!(
            "{}",
            "Row counts differ from the legacy source; review before accepting.".red()
        );
    }
    Ok(())
}

async fn cmd_backup_accounts(config: &Config) -> Result<()> {
    let pool = get_pool(config).await?;
    let path = accounts::backup_accounts(&pool, Path::new(&config.snapshot_dir)).await?;
    println!("Accounts backed up to {}", path.display());
    Ok(())
}

async fn cmd_restore_accounts(config: &Config) -> Result<()> {
    let pool = get_pool(config).await?;
    let count = accounts::restore_accounts(&pool, Path::new(&config.snapshot_dir)).await?;
    println!("{}", format!("{count} accounts restored.").green());
    Ok(())
}
