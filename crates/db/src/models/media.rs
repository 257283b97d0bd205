use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool, types::Json};
use ts_rs::TS;

use super::nullable;
use crate::ordering::{Collection, OrderingError};

const MEDIA_COLUMNS: &str = "id, cloudinary_public_id, cloudinary_url, caption, exif_data, \
     iptc_data, all_metadata, is_featured, is_masthead, masthead_order, featured_order, \
     story_id, created_at, updated_at";

/// An uploaded image asset.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct Media {
    pub id: i64,
    pub cloudinary_public_id: String,
    pub cloudinary_url: String,
    pub caption: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub exif_data: Option<Json<Value>>,
    #[ts(type = "Record<string, unknown> | null")]
    pub iptc_data: Option<Json<Value>>,
    /// Complete metadata payload returned by the image host
    #[ts(type = "Record<string, unknown> | null")]
    pub all_metadata: Option<Json<Value>>,
    pub is_featured: bool,
    pub is_masthead: bool,
    pub masthead_order: Option<i64>,
    pub featured_order: Option<i64>,
    pub story_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateMedia {
    pub cloudinary_public_id: String,
    pub cloudinary_url: String,
    pub caption: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub exif_data: Option<Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub iptc_data: Option<Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub all_metadata: Option<Value>,
    pub story_id: Option<i64>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_masthead: bool,
}

/// Partial update. Absent fields are left alone; `null` clears a nullable one.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateMedia {
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub caption: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub story_id: Option<Option<i64>>,
    #[ts(optional)]
    pub is_featured: Option<bool>,
    #[ts(optional)]
    pub is_masthead: Option<bool>,
}

impl UpdateMedia {
    pub fn is_empty(&self) -> bool {
        self.caption.is_none()
            && self.story_id.is_none()
            && self.is_featured.is_none()
            && self.is_masthead.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct MediaFilter {
    pub story_id: Option<i64>,
    pub is_featured: Option<bool>,
    pub is_masthead: Option<bool>,
}

impl Media {
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?1");
        sqlx::query_as::<_, Media>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List media matching `filter`.
    ///
    /// Featured and masthead listings follow their collection's reader order,
    /// featured winning when both flags are requested; everything else is
    /// newest first.
    pub async fn find_all(pool: &SqlitePool, filter: &MediaFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE 1 = 1"
        ));

        if let Some(story_id) = filter.story_id {
            query.push(" AND story_id = ").push_bind(story_id);
        }
        if let Some(is_featured) = filter.is_featured {
            query.push(" AND is_featured = ").push_bind(is_featured);
        }
        if let Some(is_masthead) = filter.is_masthead {
            query.push(" AND is_masthead = ").push_bind(is_masthead);
        }

        let order = match (filter.is_featured, filter.is_masthead) {
            (Some(true), _) => Collection::FeaturedMedia.order_by(),
            (_, Some(true)) => Collection::Masthead.order_by(),
            _ => "created_at DESC, id DESC".to_string(),
        };
        query.push(" ORDER BY ").push(order);

        query.build_query_as::<Media>().fetch_all(pool).await
    }

    /// Members of the masthead or featured-media collection, in reader order.
    pub async fn find_in_collection(
        pool: &SqlitePool,
        collection: Collection,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let filter = match collection {
            Collection::Masthead => MediaFilter {
                is_masthead: Some(true),
                ..Default::default()
            },
            Collection::FeaturedMedia => MediaFilter {
                is_featured: Some(true),
                ..Default::default()
            },
            _ => return Ok(Vec::new()),
        };
        Self::find_all(pool, &filter).await
    }

    pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        sqlx::query_as::<_, Media>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Register an uploaded asset. Requested masthead/featured flags append it
    /// to the end of those collections in the same transaction.
    pub async fn create(pool: &SqlitePool, data: &CreateMedia) -> Result<Self, OrderingError> {
        let mut tx = pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO media (cloudinary_public_id, cloudinary_url, caption, exif_data,
                                  iptc_data, all_metadata, story_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               RETURNING id"#,
        )
        .bind(&data.cloudinary_public_id)
        .bind(&data.cloudinary_url)
        .bind(&data.caption)
        .bind(data.exif_data.as_ref().map(Json))
        .bind(data.iptc_data.as_ref().map(Json))
        .bind(data.all_metadata.as_ref().map(Json))
        .bind(data.story_id)
        .fetch_one(&mut *tx)
        .await?;

        if data.is_masthead {
            Collection::Masthead.assign_in(&mut tx, id).await?;
        }
        if data.is_featured {
            Collection::FeaturedMedia.assign_in(&mut tx, id).await?;
        }

        let media = Self::find_by_id(&mut *tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(media)
    }

    /// Apply `data` to one row. Returns `None` when the row does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateMedia,
    ) -> Result<Option<Self>, OrderingError> {
        let mut tx = pool.begin().await?;
        if !Self::update_in(&mut tx, id, data).await? {
            return Ok(None);
        }
        let media = Self::find_by_id(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(media)
    }

    /// Apply the same update to every id, in list order, in one transaction.
    /// Flag toggles assign positions in that order. Missing ids are skipped;
    /// the number of updated rows is returned.
    pub async fn update_many(
        pool: &SqlitePool,
        ids: &[i64],
        data: &UpdateMedia,
    ) -> Result<u64, OrderingError> {
        let mut tx = pool.begin().await?;
        let mut updated = 0;
        for id in ids {
            if Self::update_in(&mut tx, *id, data).await? {
                updated += 1;
            }
        }
        tx.commit().await?;
        Ok(updated)
    }

    async fn update_in(
        conn: &mut SqliteConnection,
        id: i64,
        data: &UpdateMedia,
    ) -> Result<bool, OrderingError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            return Ok(false);
        }

        if data.caption.is_some() || data.story_id.is_some() {
            let mut query =
                QueryBuilder::<Sqlite>::new("UPDATE media SET updated_at = datetime('now', 'subsec')");
            if let Some(caption) = &data.caption {
                query.push(", caption = ").push_bind(caption.clone());
            }
            if let Some(story_id) = data.story_id {
                query.push(", story_id = ").push_bind(story_id);
            }
            query.push(" WHERE id = ").push_bind(id);
            query.build().execute(&mut *conn).await?;
        }

        match data.is_masthead {
            Some(true) => {
                Collection::Masthead.assign_in(conn, id).await?;
            }
            Some(false) => Collection::Masthead.clear_in(conn, id).await?,
            None => {}
        }
        match data.is_featured {
            Some(true) => {
                Collection::FeaturedMedia.assign_in(conn, id).await?;
            }
            Some(false) => Collection::FeaturedMedia.clear_in(conn, id).await?,
            None => {}
        }

        Ok(true)
    }

    /// Delete one row; it leaves every collection with it.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_many(pool: &SqlitePool, ids: &[i64]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM media WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}
