use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crm_auth::SystemClock;
use crm_db::connect_db;
use crm_db::migration_runner::run_migrations;
use crm_server::{AppConfig, Migrator, build_app, logging, serve};
use identity::{DEFAULT_COST, hash_password};
use tracing::info;

#[derive(Parser)]
#[command(name = "crm-server", version, about = "CRM backend server")]
struct Cli {
    /// Configuration file (YAML). Missing files fall back to defaults.
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations and serve HTTP (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print a bcrypt hash for seeding a user's password
    HashPassword {
        password: String,
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::HashPassword { password, cost }) = &cli.command {
        let hash = hash_password(password, *cost).context("hashing password")?;
        println!("{hash}");
        return Ok(());
    }

    let cfg = AppConfig::load(&cli.config)?;
    logging::init(&cfg.logging)?;

    let db = connect_db(&cfg.database.url, cfg.database.connect_opts())
        .await
        .context("connecting to database")?;
    run_migrations::<Migrator>(&db)
        .await
        .context("running migrations")?;

    match cli.command {
        Some(Command::Migrate) => {
            info!("migrations applied");
            Ok(())
        }
        Some(Command::Serve) | None => {
            let app = build_app(&cfg, db, Arc::new(SystemClock)).await?;
            serve(app, &cfg.server).await
        }
        Some(Command::HashPassword { .. }) => Ok(()),
    }
}
