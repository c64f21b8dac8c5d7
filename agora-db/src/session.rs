//! Session: one unit of work bound to one request
//!
//! ```text
//! CREATED -> ACTIVE -> COMMITTED | ROLLED_BACK -> CLOSED
//! ```
//!
//! A session begins its transaction on first use. After a commit or
//! rollback the next use begins a new transaction, which is how "commit,
//! then re-read" works. CLOSED is terminal. Dropping a session that still
//! holds a transaction rolls it back when the connection returns to the pool.

use std::fmt;
use std::sync::Arc;

use sqlx::postgres::PgConnection;
use sqlx::{Postgres, Transaction};

use crate::engine::{Checkout, Engine};
use crate::error::{DbError, Result};
use crate::registry::Entity;

/// Lifecycle state of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Active,
    Committed,
    RolledBack,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open transaction and the engine's record that its connection is held
struct Held {
    tx: Transaction<'static, Postgres>,
    _checkout: Checkout,
}

/// Unit of work over one pooled connection.
///
/// Not `Clone`: a session belongs to exactly one task, and `&mut self`
/// on every operation keeps statements in submission order.
pub struct Session {
    id: u64,
    engine: Arc<Engine>,
    state: SessionState,
    tx: Option<Held>,
}

impl Session {
    pub(crate) fn new(id: u64, engine: Arc<Engine>) -> Self {
        Self {
            id,
            engine,
            state: SessionState::Created,
            tx: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Whether a transaction (and so a pooled connection) is held.
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.is_closed() {
            return Err(DbError::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    /// Connection for the current transaction, beginning one if needed.
    ///
    /// This is where the pooled connection is acquired; use the returned
    /// connection as the executor for parameterized queries.
    pub async fn conn(&mut self) -> Result<&mut PgConnection> {
        self.ensure_open("execute on")?;

        if self.tx.is_none() {
            let tx = self.engine.pool()?.begin().await?;
            self.tx = Some(Held {
                tx,
                _checkout: self.engine.checkout(),
            });
            self.state = SessionState::Active;
            tracing::trace!(session = self.id, "transaction started");
        }

        let held = self.tx.as_mut().ok_or(DbError::InvalidState {
            state: self.state,
            operation: "execute on",
        })?;
        Ok(&mut *held.tx)
    }

    /// Re-read an entity by primary key.
    pub async fn refresh<E: Entity>(&mut self, id: i64) -> Result<E> {
        let sql = format!(r#"SELECT * FROM "{}" WHERE id = $1"#, E::TABLE);
        sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(self.conn().await?)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: E::TABLE,
                id: id.to_string(),
            })
    }

    /// Commit pending writes.
    ///
    /// A session with no open transaction commits trivially.
    pub async fn commit(&mut self) -> Result<()> {
        self.ensure_open("commit")?;

        if let Some(held) = self.tx.take() {
            if let Err(e) = held.tx.commit().await {
                // The failed transaction is dropped and rolled back by sqlx.
                self.state = SessionState::RolledBack;
                return Err(e.into());
            }
        }

        self.state = SessionState::Committed;
        tracing::trace!(session = self.id, "transaction committed");
        Ok(())
    }

    /// Discard pending writes.
    pub async fn rollback(&mut self) -> Result<()> {
        self.ensure_open("roll back")?;

        let result = match self.tx.take() {
            Some(held) => held.tx.rollback().await.map_err(DbError::from),
            None => Ok(()),
        };

        self.state = SessionState::RolledBack;
        tracing::trace!(session = self.id, "transaction rolled back");
        result
    }

    /// Release the connection. Uncommitted work is rolled back.
    ///
    /// The session is CLOSED afterwards even if the rollback fails.
    /// Closing a closed session is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let result = match self.tx.take() {
            Some(held) => {
                tracing::debug!(session = self.id, "closing session with open transaction");
                held.tx.rollback().await.map_err(DbError::from)
            }
            None => Ok(()),
        };

        self.state = SessionState::Closed;
        tracing::trace!(session = self.id, "session closed");
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!(
                session = self.id,
                state = %self.state,
                "session dropped with an open transaction, rolling back"
            );
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    fn session_without_database() -> Session {
        Session::new(1, Arc::new(Engine::new(EngineConfig::default())))
    }

    #[tokio::test]
    async fn starts_created_without_io() {
        let session = session_without_database();
        assert_eq!(session.state(), SessionState::Created);
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn first_use_surfaces_configuration_error() {
        let mut session = session_without_database();
        let err = session.conn().await.unwrap_err();
        assert!(matches!(err, DbError::Configuration(_)));
        assert_eq!(session.state(), SessionState::Created);
    }

    #[tokio::test]
    async fn commit_and_rollback_without_transaction() {
        let mut session = session_without_database();

        session.commit().await.unwrap();
        assert_eq!(session.state(), SessionState::Committed);

        session.rollback().await.unwrap();
        assert_eq!(session.state(), SessionState::RolledBack);

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn closed_session_rejects_operations() {
        let mut session = session_without_database();
        session.close().await.unwrap();

        assert!(matches!(
            session.conn().await.unwrap_err(),
            DbError::InvalidState { state: SessionState::Closed, .. }
        ));
        assert!(matches!(
            session.commit().await.unwrap_err(),
            DbError::InvalidState { operation: "commit", .. }
        ));
        assert!(matches!(
            session.rollback().await.unwrap_err(),
            DbError::InvalidState { operation: "roll back", .. }
        ));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut session = session_without_database();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(session.is_closed());
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::RolledBack.to_string(), "rolled back");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
