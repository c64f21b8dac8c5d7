use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::registry::{Entity, TableDef};

/// A user's comment on a post
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Comment {
    const TABLE: &'static str = "comments";

    fn table_def() -> TableDef {
        TableDef {
            name: "comments",
            create: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGSERIAL PRIMARY KEY,
                post_id BIGINT NOT NULL REFERENCES post(id) ON DELETE CASCADE,
                user_id BIGINT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            indexes: &[
                "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
                "CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user_id)",
            ],
            references: &["post", "user"],
        }
    }
}
