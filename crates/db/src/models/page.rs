use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Free-form page content keyed by slug, e.g. `about`.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct Page {
    pub slug: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpsertPage {
    pub slug: String,
    pub content: String,
}

impl Page {
    pub async fn find(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Page>("SELECT slug, content, updated_at FROM pages WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(pool: &SqlitePool, slug: &str, content: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Page>(
            r#"INSERT INTO pages (slug, content) VALUES (?1, ?2)
               ON CONFLICT(slug) DO UPDATE
               SET content = excluded.content, updated_at = datetime('now', 'subsec')
               RETURNING slug, content, updated_at"#,
        )
        .bind(slug)
        .bind(content)
        .fetch_one(pool)
        .await
    }
}
