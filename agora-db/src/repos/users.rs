//! User repository
//!
//! Operates on a borrowed [`Session`]. Writes commit explicitly and then
//! re-read the row in a fresh transaction. Lookups that find nothing
//! return [`DbError::NotFound`]; translating that to a status code is the
//! HTTP layer's job.

use sqlx::{Postgres, QueryBuilder};

use crate::error::{DbError, Result};
use crate::models::{FilterValue, NewUser, User, UserFilter, UserUpdate};
use crate::session::Session;

const USER_COLUMNS: &str = "id, email, username, is_confirmed, created_at, updated_at";

/// User repository
pub struct UserRepo<'a> {
    session: &'a mut Session,
}

impl<'a> UserRepo<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Roll back after a failed write and hand back the write's error.
    ///
    /// A failing rollback is logged, never returned in its place.
    async fn abandon(&mut self, err: DbError) -> DbError {
        if let Err(rollback_err) = self.session.rollback().await {
            tracing::warn!(
                session = self.session.id(),
                error = %rollback_err,
                "rollback after failed write failed"
            );
        }
        err
    }

    /// List users ordered by id.
    pub async fn get_all(&mut self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let sql = format!(
            r#"SELECT {} FROM "user" ORDER BY id LIMIT $1 OFFSET $2"#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.session.conn().await?)
            .await?;
        Ok(users)
    }

    fn select_where(filters: &[UserFilter]) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!(r#"SELECT {} FROM "user""#, USER_COLUMNS));

        for (i, filter) in filters.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(filter.field.column());
            builder.push(" = ");
            match &filter.value {
                FilterValue::Int(v) => builder.push_bind(*v),
                FilterValue::Text(v) => builder.push_bind(v.clone()),
                FilterValue::Bool(v) => builder.push_bind(*v),
            };
        }

        builder.push(" ORDER BY id");
        builder
    }

    fn describe(filters: &[UserFilter]) -> String {
        filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Find exactly one user matching every filter.
    pub async fn find_unique(&mut self, filters: &[UserFilter]) -> Result<User> {
        if filters.is_empty() {
            return Err(DbError::MissingFilter);
        }

        let mut builder = Self::select_where(filters);
        builder.push(" LIMIT 1");

        builder
            .build_query_as::<User>()
            .fetch_optional(self.session.conn().await?)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "user",
                id: Self::describe(filters),
            })
    }

    /// Find every user matching all filters. No filters matches everyone.
    pub async fn find_many(&mut self, filters: &[UserFilter]) -> Result<Vec<User>> {
        let mut builder = Self::select_where(filters);
        let users = builder
            .build_query_as::<User>()
            .fetch_all(self.session.conn().await?)
            .await?;

        if users.is_empty() {
            return Err(DbError::NotFound {
                resource: "users",
                id: Self::describe(filters),
            });
        }
        Ok(users)
    }

    /// Run trusted raw SQL, returning each row as a JSON object.
    ///
    /// The statement is wrapped in `row_to_json`, so it must be a single
    /// query that produces rows. Never pass user input here.
    pub async fn find_by_query(&mut self, query: &str) -> Result<Vec<serde_json::Value>> {
        let query = query.trim().trim_end_matches(';');
        let sql = format!("SELECT row_to_json(q) FROM ({}) q", query);

        let rows: Vec<serde_json::Value> = sqlx::query_scalar(&sql)
            .fetch_all(self.session.conn().await?)
            .await?;

        if rows.is_empty() {
            return Err(DbError::NotFound {
                resource: "records",
                id: query.to_owned(),
            });
        }
        Ok(rows)
    }

    /// Insert a user, commit, and return the stored row.
    ///
    /// New users are always unconfirmed.
    pub async fn create_one(&mut self, user: NewUser) -> Result<User> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO "user" (email, username, is_confirmed)
            VALUES ($1, $2, FALSE)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .fetch_one(self.session.conn().await?)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(e) => return Err(self.abandon(DbError::from_write(e)).await),
        };

        self.session.commit().await?;
        tracing::debug!(user_id = id, "user created");
        self.session.refresh::<User>(id).await
    }

    /// Apply the provided fields to an existing user, commit, and return
    /// the refreshed row.
    pub async fn update_one(&mut self, id: i64, update: UserUpdate) -> Result<User> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(r#"UPDATE "user" SET updated_at = NOW()"#);
        if let Some(email) = update.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(username) = update.username {
            builder.push(", username = ").push_bind(username);
        }
        if let Some(is_confirmed) = update.is_confirmed {
            builder.push(", is_confirmed = ").push_bind(is_confirmed);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let updated = builder
            .build()
            .execute(self.session.conn().await?)
            .await;

        let rows = match updated {
            Ok(result) => result.rows_affected(),
            Err(e) => return Err(self.abandon(DbError::from_write(e)).await),
        };

        if rows == 0 {
            let err = DbError::NotFound {
                resource: "user",
                id: id.to_string(),
            };
            return Err(self.abandon(err).await);
        }

        self.session.commit().await?;
        self.session.refresh::<User>(id).await
    }

    /// Delete a user. Posts, likes and comments go with it.
    pub async fn delete_one(&mut self, id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(self.session.conn().await?)
            .await?;

        if result.rows_affected() == 0 {
            let err = DbError::NotFound {
                resource: "user",
                id: id.to_string(),
            };
            return Err(self.abandon(err).await);
        }

        self.session.commit().await?;
        tracing::debug!(user_id = id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn builds_where_clause_in_order() {
        let filters = [UserFilter::email("a@b.io"), UserFilter::username("alice")];
        let mut builder = UserRepo::select_where(&filters);
        let sql = builder.build().sql().to_owned();
        assert!(sql.ends_with("WHERE email = $1 AND username = $2 ORDER BY id"));
    }

    #[test]
    fn no_filters_selects_everything() {
        let mut builder = UserRepo::select_where(&[]);
        let sql = builder.build().sql().to_owned();
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn describes_filters() {
        let filters = [UserFilter::id(3), UserFilter::username("bob")];
        assert_eq!(UserRepo::describe(&filters), "id=3, username=bob");
    }

    #[tokio::test]
    async fn find_unique_requires_a_filter() {
        let engine = std::sync::Arc::new(crate::Engine::new(crate::EngineConfig::default()));
        let mut session = crate::SessionFactory::new(engine).new_session();
        let err = UserRepo::new(&mut session).find_unique(&[]).await.unwrap_err();
        assert!(matches!(err, DbError::MissingFilter));
        // Rejected before any connection was requested
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn failed_rollback_keeps_write_error() {
        let engine = std::sync::Arc::new(crate::Engine::new(crate::EngineConfig::default()));
        let mut session = crate::SessionFactory::new(engine).new_session();
        session.close().await.unwrap();

        // Rolling back a closed session fails; the write error still wins
        let err = UserRepo::new(&mut session)
            .abandon(DbError::Conflict("duplicate key".into()))
            .await;
        assert!(matches!(err, DbError::Conflict(ref m) if m == "duplicate key"));
    }
}
