//! Session factory and scoped units of work

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::engine::Engine;
use crate::session::Session;

/// Mints sessions bound to one engine.
///
/// Cheap to clone; clones share the engine and the session id counter.
#[derive(Clone)]
pub struct SessionFactory {
    engine: Arc<Engine>,
    next_id: Arc<AtomicU64>,
}

impl SessionFactory {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Create a session. No I/O: the connection is acquired on first use.
    pub fn new_session(&self) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Session::new(id, Arc::clone(&self.engine))
    }

    /// Run one unit of work in a fresh session.
    ///
    /// The callback is responsible for committing. If it returns an error
    /// the session is rolled back, then closed, and the original error is
    /// returned unchanged. The session is closed on every exit path; if
    /// this future is dropped mid-flight the session's transaction is
    /// rolled back as the session drops.
    ///
    /// ```ignore
    /// let user = factory
    ///     .scope(|session| Box::pin(async move { UserRepo::new(session).get(id).await }))
    ///     .await?;
    /// ```
    pub async fn scope<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: Display,
    {
        let mut session = self.new_session();
        let outcome = work(&mut session).await;

        if let Err(e) = &outcome {
            tracing::error!(session = session.id(), error = %e, "unit of work failed");
            if !session.is_closed() {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::error!(
                        session = session.id(),
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
            }
        }

        if let Err(close_err) = session.close().await {
            tracing::warn!(session = session.id(), error = %close_err, "close failed");
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::error::DbError;
    use crate::session::SessionState;

    fn factory_without_database() -> SessionFactory {
        SessionFactory::new(Arc::new(Engine::new(EngineConfig::default())))
    }

    #[derive(Debug, PartialEq)]
    struct Boom(&'static str);

    impl Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let factory = factory_without_database();
        let a = factory.new_session();
        let b = factory.clone().new_session();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.state(), SessionState::Created);
    }

    #[tokio::test]
    async fn scope_returns_value() {
        let factory = factory_without_database();
        let value: Result<u32, DbError> = factory
            .scope(|session| {
                Box::pin(async move {
                    session.commit().await?;
                    Ok(42)
                })
            })
            .await;
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn scope_reraises_original_error() {
        let factory = factory_without_database();
        let result: Result<(), Boom> = factory
            .scope(|_session| Box::pin(async move { Err(Boom("handler failed")) }))
            .await;
        assert_eq!(result.unwrap_err(), Boom("handler failed"));
    }

    #[tokio::test]
    async fn scope_tolerates_callback_closing_session() {
        let factory = factory_without_database();
        let result: Result<(), DbError> = factory
            .scope(|session| {
                Box::pin(async move {
                    session.close().await?;
                    session.commit().await
                })
            })
            .await;
        assert!(matches!(result.unwrap_err(), DbError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn scope_surfaces_configuration_error_on_first_statement() {
        let factory = factory_without_database();
        let result: Result<(), DbError> = factory
            .scope(|session| {
                Box::pin(async move {
                    session.conn().await?;
                    Ok(())
                })
            })
            .await;
        assert!(matches!(result.unwrap_err(), DbError::Configuration(_)));
    }
}
