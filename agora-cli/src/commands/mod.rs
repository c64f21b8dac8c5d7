pub mod db_init;
pub mod serve;

pub use db_init::DbInitArgs;
pub use serve::ServeArgs;

use std::sync::Arc;

use agora_core::Settings;
use agora_db::{models, Database, EngineConfig, EngineProvider};
use anyhow::{Context, Result};

/// Load `.env`, read settings, and apply a `--database-url` override.
pub(crate) fn load_settings(database_url: Option<String>) -> Result<Settings> {
    agora_core::load_dotenv();

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if let Some(url) = database_url {
        settings.database.url = Some(url);
    }
    tracing::debug!(
        environment = settings.environment.as_str(),
        "settings loaded"
    );
    Ok(settings)
}

/// The process-wide database handle: one engine, one registry.
pub(crate) fn open_database(settings: &Settings) -> Database {
    let provider = EngineProvider::new(EngineConfig::from(&settings.database));
    Database::new(&provider, Arc::new(models::registry()))
}
