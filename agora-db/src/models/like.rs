use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::registry::{Entity, TableDef};

/// A user's like on a post
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Like {
    const TABLE: &'static str = "likes";

    fn table_def() -> TableDef {
        TableDef {
            name: "likes",
            create: r#"
            CREATE TABLE IF NOT EXISTS likes (
                id BIGSERIAL PRIMARY KEY,
                post_id BIGINT NOT NULL REFERENCES post(id) ON DELETE CASCADE,
                user_id BIGINT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            indexes: &[
                "CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)",
                "CREATE INDEX IF NOT EXISTS idx_likes_user ON likes(user_id)",
            ],
            references: &["post", "user"],
        }
    }
}
