//! Seed data script - populates an empty database with the MatrixInc demo catalog
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://matrixinc.db?mode=rwc
//!
//! This creates the four demo customers, three products, four parts and a month
//! of randomly generated orders. A database that already has customers is left alone.

use anyhow::Context;
use clap::Parser;
use tracing::info;

use matrixinc_api::{config, db};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the MatrixInc database with demo data")]
struct Args {
    /// Database to seed; defaults to the configured `database_url`
    #[arg(long)]
    database_url: Option<String>,

    /// Do not run pending migrations first
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    if let Some(url) = args.database_url {
        cfg.database_url = url;
    }

    info!("=== MatrixInc Seed Data ===");
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    if !args.skip_migrations {
        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
    }

    let summary = db::seed::initialize(&pool)
        .await
        .context("failed to seed demo data")?;

    if summary.skipped {
        info!("Database already holds customers; nothing seeded");
    } else {
        info!(
            customers = summary.customers,
            products = summary.products,
            parts = summary.parts,
            orders = summary.orders,
            "Seed data complete"
        );
        info!("Try: curl http://localhost:8080/api/v1/dashboard");
    }

    db::close_pool(pool).await.context("failed to close pool")?;
    Ok(())
}
