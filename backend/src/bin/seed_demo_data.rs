//! Seed demonstration accounts, stock, donations, and requests.
//!
//! With a database URL the dataset is written to PostgreSQL after applying
//! pending migrations. Without one the dataset is applied to a throwaway
//! in-memory store, which validates it and reports what would be written.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use donor_backend::demo_data::{DemoSeeder, SeedPorts, SeedReport, load_dataset};
use donor_backend::outbound::credentials::Argon2idHasher;
use donor_backend::outbound::memory::InMemoryStore;
use donor_backend::outbound::persistence::{
    DbPool, DieselBloodRequestRepository, DieselBloodStockRepository,
    DieselDonorRecordRepository, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use donor_backend::settings::AppSettings;

/// `seed-demo-data` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seed-demo-data",
    about = "Load the demonstration dataset into blood bank storage",
    version
)]
struct CliArgs {
    /// Dataset file. Falls back to `BLOOD_BANK_DEMO_DATA_FILE`, then the
    /// bundled fixture.
    #[arg(long = "dataset", value_name = "path")]
    dataset: Option<PathBuf>,
    /// Database connection URL. Falls back to `BLOOD_BANK_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build seeding runtime")?;
    let report = runtime.block_on(run(args))?;
    println!(
        "created {} users ({} already present), {} stock rows, {} donor records, {} blood requests",
        report.users_created,
        report.users_skipped,
        report.stocks_written,
        report.donor_records_created,
        report.blood_requests_created,
    );
    Ok(())
}

async fn run(args: CliArgs) -> Result<SeedReport> {
    let settings = AppSettings::load_from_iter([OsString::from("seed-demo-data")])
        .map_err(|e| eyre!("failed to load configuration: {e}"))?;
    let dataset_path = args
        .dataset
        .unwrap_or_else(|| settings.demo_data_file());
    let dataset = load_dataset(&dataset_path)?;
    info!(path = %dataset_path.display(), "demo dataset loaded");

    let database_url = args
        .database_url
        .or_else(|| settings.database_url().map(str::to_owned));
    let hasher = Arc::new(Argon2idHasher::default());
    let clock = Arc::new(DefaultClock);

    let Some(database_url) = database_url else {
        warn!("no database configured; validating dataset against in-memory storage");
        let store = Arc::new(InMemoryStore::new());
        let seeder = DemoSeeder::new(
            SeedPorts {
                users: Arc::clone(&store),
                records: Arc::clone(&store),
                stocks: Arc::clone(&store),
                requests: store,
                hasher,
            },
            clock,
        );
        return Ok(seeder.seed(&dataset).await?);
    };

    let applied = run_pending_migrations(&database_url)
        .await
        .wrap_err("failed to apply migrations")?;
    info!(applied = applied.len(), "database migrations complete");
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("failed to create database pool")?;
    let seeder = DemoSeeder::new(
        SeedPorts {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            records: Arc::new(DieselDonorRecordRepository::new(pool.clone())),
            stocks: Arc::new(DieselBloodStockRepository::new(pool.clone())),
            requests: Arc::new(DieselBloodRequestRepository::new(pool)),
            hasher,
        },
        clock,
    );
    Ok(seeder.seed(&dataset).await?)
}
