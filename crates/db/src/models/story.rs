use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use ts_rs::TS;

use super::nullable;
use crate::ordering::{Collection, OrderingError};

const STORY_COLUMNS: &str = "id, slug, title, year, location, narrative, \
     featured_image_public_id, is_featured, featured_order, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("title must contain at least one letter or digit")]
    EmptySlug,
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A photo essay: narrative text plus an ordered image sequence.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct Story {
    pub id: i64,
    /// URL slug derived from the title at creation
    pub slug: String,
    pub title: String,
    pub year: Option<i64>,
    pub location: Option<String>,
    pub narrative: Option<String>,
    pub featured_image_public_id: Option<String>,
    pub is_featured: bool,
    pub featured_order: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateStory {
    pub title: String,
    pub year: Option<i64>,
    pub location: Option<String>,
    pub narrative: Option<String>,
    pub featured_image_public_id: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateStory {
    #[ts(optional)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub year: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub narrative: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub featured_image_public_id: Option<Option<String>>,
    #[ts(optional)]
    pub is_featured: Option<bool>,
}

/// Lowercase the title and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, with no leading or trailing dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

impl Story {
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1");
        sqlx::query_as::<_, Story>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE slug = ?1");
        sqlx::query_as::<_, Story>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// All stories newest first, or only the featured ones in reader order.
    pub async fn find_all(pool: &SqlitePool, featured_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = if featured_only {
            format!(
                "SELECT {STORY_COLUMNS} FROM stories WHERE is_featured = 1 ORDER BY {}",
                Collection::FeaturedStories.order_by()
            )
        } else {
            format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC, id DESC")
        };
        sqlx::query_as::<_, Story>(&sql).fetch_all(pool).await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateStory) -> Result<Self, StoryError> {
        let slug = slugify(&data.title);
        if slug.is_empty() {
            return Err(StoryError::EmptySlug);
        }

        let mut tx = pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO stories (slug, title, year, location, narrative, featured_image_public_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               RETURNING id"#,
        )
        .bind(&slug)
        .bind(&data.title)
        .bind(data.year)
        .bind(&data.location)
        .bind(&data.narrative)
        .bind(&data.featured_image_public_id)
        .fetch_one(&mut *tx)
        .await?;

        if data.is_featured {
            Collection::FeaturedStories.assign_in(&mut tx, id).await?;
        }

        let story = Self::find_by_id(&mut *tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(story)
    }

    /// Partial update. The slug is fixed at creation and never regenerated.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateStory,
    ) -> Result<Option<Self>, StoryError> {
        let mut tx = pool.begin().await?;
        if Self::find_by_id(&mut *tx, id).await?.is_none() {
            return Ok(None);
        }

        let mut query =
            QueryBuilder::<Sqlite>::new("UPDATE stories SET updated_at = datetime('now', 'subsec')");
        if let Some(title) = &data.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(year) = data.year {
            query.push(", year = ").push_bind(year);
        }
        if let Some(location) = &data.location {
            query.push(", location = ").push_bind(location.clone());
        }
        if let Some(narrative) = &data.narrative {
            query.push(", narrative = ").push_bind(narrative.clone());
        }
        if let Some(public_id) = &data.featured_image_public_id {
            query.push(", featured_image_public_id = ").push_bind(public_id.clone());
        }
        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(&mut *tx).await?;

        match data.is_featured {
            Some(true) => {
                Collection::FeaturedStories.assign_in(&mut tx, id).await?;
            }
            Some(false) => Collection::FeaturedStories.clear_in(&mut tx, id).await?,
            None => {}
        }

        let story = Self::find_by_id(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(story)
    }

    /// Delete a story. Its images go with it and linked media are unlinked.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_many(pool: &SqlitePool, ids: &[i64]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM stories WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}
