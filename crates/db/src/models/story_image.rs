use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use ts_rs::TS;

use super::nullable;
use crate::ordering::Collection;

const STORY_IMAGE_COLUMNS: &str =
    "id, story_id, cloudinary_public_id, caption, order_index, created_at";

/// One image in a story's sequence.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct StoryImage {
    pub id: i64,
    pub story_id: i64,
    pub cloudinary_public_id: String,
    pub caption: Option<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateStoryImage {
    pub cloudinary_public_id: String,
    pub caption: Option<String>,
    /// Explicit position; omitted appends after the last image
    #[ts(optional)]
    pub order_index: Option<i64>,
}

/// Explicit write to one image. Used by clients that compute a neighbour swap
/// themselves and send both rows.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct StoryImageUpdate {
    pub id: i64,
    #[ts(optional)]
    pub order_index: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub caption: Option<Option<String>>,
}

impl StoryImage {
    pub async fn find_by_story(pool: &SqlitePool, story_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {STORY_IMAGE_COLUMNS} FROM story_images WHERE story_id = ?1 ORDER BY {}",
            Collection::StoryImages { story_id }.order_by()
        );
        sqlx::query_as::<_, StoryImage>(&sql)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        story_id: i64,
        data: &CreateStoryImage,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let image = Self::create_in(&mut tx, story_id, data).await?;
        tx.commit().await?;
        Ok(image)
    }

    /// Add several images in request order. Images without an explicit
    /// position get consecutive positions after the story's current last one.
    pub async fn create_many(
        pool: &SqlitePool,
        story_id: i64,
        images: &[CreateStoryImage],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(images.len());
        for data in images {
            created.push(Self::create_in(&mut tx, story_id, data).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn create_in(
        conn: &mut SqliteConnection,
        story_id: i64,
        data: &CreateStoryImage,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO story_images (story_id, cloudinary_public_id, caption, order_index)
               VALUES (?1, ?2, ?3, COALESCE(?4, (
                   SELECT COALESCE(MAX(order_index), -1) + 1 FROM story_images WHERE story_id = ?1
               )))
               RETURNING {STORY_IMAGE_COLUMNS}"#
        );
        let image = sqlx::query_as::<_, StoryImage>(&sql)
            .bind(story_id)
            .bind(&data.cloudinary_public_id)
            .bind(&data.caption)
            .bind(data.order_index)
            .fetch_one(&mut *conn)
            .await?;

        // The media row behind the image now belongs to this story.
        sqlx::query(
            "UPDATE media SET story_id = ?1, updated_at = datetime('now', 'subsec')
             WHERE cloudinary_public_id = ?2",
        )
        .bind(story_id)
        .bind(&data.cloudinary_public_id)
        .execute(&mut *conn)
        .await?;

        Ok(image)
    }

    /// Apply explicit position/caption writes in one transaction. Ids that do
    /// not belong to the story are ignored; returns the number of rows changed.
    pub async fn update_many(
        pool: &SqlitePool,
        story_id: i64,
        updates: &[StoryImageUpdate],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut changed = 0;

        for update in updates {
            if update.order_index.is_none() && update.caption.is_none() {
                continue;
            }
            let mut query = QueryBuilder::<Sqlite>::new("UPDATE story_images SET ");
            let mut assignments = query.separated(", ");
            if let Some(order_index) = update.order_index {
                assignments.push("order_index = ");
                assignments.push_bind_unseparated(order_index);
            }
            if let Some(caption) = &update.caption {
                assignments.push("caption = ");
                assignments.push_bind_unseparated(caption.clone());
            }
            query.push(" WHERE id = ").push_bind(update.id);
            query.push(" AND story_id = ").push_bind(story_id);

            changed += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(changed)
    }

    pub async fn delete(pool: &SqlitePool, story_id: i64, image_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM story_images WHERE id = ?1 AND story_id = ?2")
            .bind(image_id)
            .bind(story_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_many(
        pool: &SqlitePool,
        story_id: i64,
        image_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        if image_ids.is_empty() {
            return Ok(0);
        }
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM story_images WHERE story_id = ");
        query.push_bind(story_id).push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in image_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}
