//! agora-db: database lifecycle and repositories
//!
//! Lifecycle chain, leaf first:
//!
//! - [`EngineProvider`] builds the process-wide [`Engine`] (lazy connection pool) once
//! - [`Registry`] holds the entity-to-table mappings, frozen after construction
//! - [`SessionFactory`] mints [`Session`]s bound to the engine, without I/O
//! - [`SessionFactory::scope`] runs one unit of work with guaranteed rollback and close
//! - [`SchemaInitializer`] applies the registry at startup with fixed-interval retry
//!
//! [`Database`] wires these together and is handed to the HTTP layer.

pub mod database;
pub mod engine;
pub mod error;
pub mod factory;
pub mod initializer;
pub mod models;
pub mod registry;
pub mod repos;
pub mod retry;
pub mod session;

pub use database::Database;
pub use engine::{Engine, EngineConfig, EngineProvider};
pub use error::{DbError, Result};
pub use factory::SessionFactory;
pub use initializer::SchemaInitializer;
pub use registry::{Entity, Registry, RegistryBuilder, TableDef};
pub use retry::{retry_fixed, RetryError, RetryPolicy};
pub use session::{Session, SessionState};
