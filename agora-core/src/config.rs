use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// Load environment variables from .env files in multiple locations
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.agora/.env
///
/// dotenvy never overwrites variables that are already present.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(format!("current directory ({})", path.display()));
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from ~/.agora: {}", env_file.display());
                    loaded_from.push(format!("~/.agora/.env ({})", env_file.display()));
                }
                Err(e) => debug!("Failed to load ~/.agora/.env: {}", e),
            }
        }
    }

    if loaded_from.is_empty() {
        info!("Using environment variables only (no .env file found)");
    } else {
        info!("Loaded configuration from: {}", loaded_from.join(", "));
    }
}

/// Get the agora config directory path (~/.agora)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agora"))
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::invalid(
                "ENVIRONMENT",
                format!("expected local, staging or production, got '{}'", other),
            )),
        }
    }
}

/// Database settings.
///
/// The URL is kept as a raw string: it is only parsed when the engine
/// first hands out a connection.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Log every SQL statement
    pub echo: bool,
}

/// AWS credentials and bucket for object storage
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket_name: Option<String>,
    /// Custom endpoint (LocalStack, MinIO)
    pub endpoint_url: Option<String>,
}

impl AwsSettings {
    /// Storage is only enabled when a bucket is configured.
    pub fn is_configured(&self) -> bool {
        self.bucket_name.is_some()
    }
}

/// Chat-completion provider settings
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub database: DatabaseSettings,
    pub aws: AwsSettings,
    pub openai: OpenAiSettings,
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("ENVIRONMENT") {
            Some(v) => v.parse()?,
            None => Environment::default(),
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            // A zero-sized pool never hands out a connection
            Some(v) => v
                .parse::<NonZeroU32>()
                .map(NonZeroU32::get)
                .map_err(|e| ConfigError::invalid("DB_MAX_CONNECTIONS", e.to_string()))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let echo = match get("DB_ECHO") {
            Some(v) => parse_bool("DB_ECHO", &v)?,
            None => environment.is_local(),
        };

        Ok(Self {
            environment,
            bind_addr,
            database: DatabaseSettings {
                url: get("DATABASE_URL"),
                max_connections,
                echo,
            },
            aws: AwsSettings {
                region: get("AWS_REGION"),
                access_key_id: get("AWS_ACCESS_KEY_ID"),
                secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
                bucket_name: get("AWS_BUCKET_NAME"),
                endpoint_url: get("AWS_ENDPOINT_URL"),
            },
            openai: OpenAiSettings {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("OPENAI_HTTP_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                model: get("CHAT_COMPLETION_MODEL")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            },
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("'{}' is not a boolean", other))),
    }
}
