//! agora-core: settings shared by every agora crate
//!
//! Settings are read from the process environment once at startup
//! and handed to constructors explicitly.

pub mod config;
pub mod error;

pub use config::{load_dotenv, AwsSettings, DatabaseSettings, Environment, OpenAiSettings, Settings};
pub use error::{ConfigError, Result};
