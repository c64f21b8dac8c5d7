use std::time::Duration;

use agora_db::RetryPolicy;
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct DbInitArgs {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Attempts before giving up on an unreachable database
    #[arg(long, default_value_t = agora_db::retry::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = agora_db::retry::DEFAULT_INTERVAL.as_secs())]
    pub interval_secs: u64,
}

impl DbInitArgs {
    fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            interval: Duration::from_secs(self.interval_secs),
        }
    }
}

pub async fn run_db_init(args: DbInitArgs) -> Result<()> {
    let policy = args.policy();
    let settings = super::load_settings(args.database_url)?;
    let db = super::open_database(&settings);

    let outcome = db
        .initializer(policy)
        .initialize_schema()
        .await
        .context("Database schema initialization failed");

    db.engine().dispose().await;
    outcome?;

    println!("Schema ready ({} tables)", db.registry().len());
    Ok(())
}
