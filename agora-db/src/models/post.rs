use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::registry::{Entity, TableDef};

/// Post record, authored by a user
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const TABLE: &'static str = "post";

    fn table_def() -> TableDef {
        TableDef {
            name: "post",
            create: r#"
            CREATE TABLE IF NOT EXISTS post (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author_id BIGINT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
                image_url TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            indexes: &["CREATE INDEX IF NOT EXISTS idx_post_author ON post(author_id)"],
            references: &["user"],
        }
    }
}
