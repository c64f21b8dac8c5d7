use std::net::SocketAddr;
use std::sync::Arc;

use agora_core::Settings;
use agora_db::RetryPolicy;
use agora_server::{run_server, AppState, ServerConfig};
use agora_services::{ChatCompletion, HttpClient, S3Storage};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short, env = "BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Allow all CORS origins (default: localhost only)
    #[arg(long)]
    pub cors_permissive: bool,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = super::load_settings(args.database_url)?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    tracing::info!(
        environment = settings.environment.as_str(),
        bind = %settings.bind_addr,
        "starting agora"
    );

    let db = super::open_database(&settings);
    // Nothing is served until the schema exists.
    db.initializer(RetryPolicy::default())
        .initialize_schema()
        .await
        .context("Database schema initialization failed")?;

    let state = attach_services(AppState::new(db), &settings).await?;

    let config = ServerConfig {
        bind_addr: settings.bind_addr,
        cors_permissive: args.cors_permissive,
    };
    run_server(state, config).await.context("Server error")?;
    Ok(())
}

/// Wire the optional outbound services; missing ones disable their routes.
async fn attach_services(mut state: AppState, settings: &Settings) -> Result<AppState> {
    let chat = HttpClient::new().and_then(|http| ChatCompletion::new(http, &settings.openai));
    match chat {
        Ok(chat) => state = state.with_chat(Arc::new(chat)),
        Err(e) => tracing::warn!(error = %e, "chat completion disabled"),
    }

    if settings.aws.is_configured() {
        let storage = S3Storage::from_settings(&settings.aws)
            .await
            .context("Failed to configure object storage")?;
        tracing::info!(bucket = storage.bucket(), "object storage enabled");
        state = state.with_storage(Arc::new(storage));
    } else {
        tracing::warn!("AWS_BUCKET_NAME not set, file routes disabled");
    }

    Ok(state)
}
