use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;

/// A site-wide key/value setting with a JSON value.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct Setting {
    pub key: String,
    #[ts(type = "unknown")]
    pub value: Json<Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpsertSetting {
    pub key: String,
    #[ts(type = "unknown")]
    pub value: Value,
}

impl Setting {
    pub async fn find(pool: &SqlitePool, key: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(pool)
            .await
    }

    pub async fn upsert(pool: &SqlitePool, key: &str, value: &Value) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Setting>(
            r#"INSERT INTO settings (key, value) VALUES (?1, ?2)
               ON CONFLICT(key) DO UPDATE
               SET value = excluded.value, updated_at = datetime('now', 'subsec')
               RETURNING key, value, updated_at"#,
        )
        .bind(key)
        .bind(Json(value))
        .fetch_one(pool)
        .await
    }
}
