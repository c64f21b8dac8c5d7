//! Process-wide database handle
//!
//! Built once at startup and passed to every consumer. Holds the single
//! engine, the single frozen registry, and the session factory bound to
//! that engine.

use std::sync::Arc;

use crate::engine::{Engine, EngineProvider};
use crate::factory::SessionFactory;
use crate::initializer::SchemaInitializer;
use crate::registry::Registry;
use crate::retry::RetryPolicy;
use crate::session::Session;

#[derive(Clone)]
pub struct Database {
    engine: Arc<Engine>,
    registry: Arc<Registry>,
    sessions: SessionFactory,
}

impl Database {
    pub fn new(provider: &EngineProvider, registry: Arc<Registry>) -> Self {
        let engine = provider.get_engine();
        let sessions = SessionFactory::new(Arc::clone(&engine));
        Self {
            engine,
            registry,
            sessions,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }

    /// A new unscoped session; the caller must close it.
    /// Prefer [`SessionFactory::scope`].
    pub fn get_session(&self) -> Session {
        self.sessions.new_session()
    }

    /// Initializer over this handle's engine and registry.
    pub fn initializer(&self, policy: RetryPolicy) -> SchemaInitializer {
        SchemaInitializer::new(Arc::clone(&self.engine), Arc::clone(&self.registry))
            .with_policy(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    #[test]
    fn shares_one_engine_and_registry() {
        let provider = EngineProvider::new(EngineConfig::new("postgres://localhost/agora"));
        let registry = Arc::new(crate::models::registry());
        let db = Database::new(&provider, Arc::clone(&registry));

        assert!(Arc::ptr_eq(db.engine(), &provider.get_engine()));
        assert!(Arc::ptr_eq(db.sessions().engine(), db.engine()));
        assert!(Arc::ptr_eq(db.registry(), &registry));
        assert_eq!(db.initializer(RetryPolicy::default()).policy().max_attempts, 30);
    }
}
