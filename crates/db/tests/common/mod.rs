#![allow(dead_code)]

pub use db::test_utils::create_test_pool;
use sqlx::SqlitePool;

pub async fn insert_media(pool: &SqlitePool, public_id: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO media (cloudinary_public_id, cloudinary_url) VALUES (?1, ?2) RETURNING id",
    )
    .bind(public_id)
    .bind(format!("https://img.example/{public_id}.jpg"))
    .fetch_one(pool)
    .await
    .expect("insert media")
}

pub async fn insert_story(pool: &SqlitePool, slug: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO stories (slug, title) VALUES (?1, ?1) RETURNING id")
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("insert story")
}

pub async fn insert_story_image(pool: &SqlitePool, story_id: i64, order_index: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO story_images (story_id, cloudinary_public_id, order_index)
         VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(story_id)
    .bind(format!("story-{story_id}-{order_index}"))
    .bind(order_index)
    .fetch_one(pool)
    .await
    .expect("insert story image")
}

/// Pin `created_at` so reader tie-breaks are deterministic.
pub async fn set_created_at(pool: &SqlitePool, table: &str, id: i64, timestamp: &str) {
    sqlx::query(&format!("UPDATE {table} SET created_at = ?1 WHERE id = ?2"))
        .bind(timestamp)
        .bind(id)
        .execute(pool)
        .await
        .expect("set created_at");
}

/// Raw flag/position write, bypassing the ordering rules, to simulate legacy rows.
pub async fn force_media_slot(
    pool: &SqlitePool,
    id: i64,
    flag: &str,
    column: &str,
    position: Option<i64>,
) {
    sqlx::query(&format!("UPDATE media SET {flag} = 1, {column} = ?1 WHERE id = ?2"))
        .bind(position)
        .bind(id)
        .execute(pool)
        .await
        .expect("force media slot");
}

pub async fn media_slot(pool: &SqlitePool, id: i64, flag: &str, column: &str) -> (bool, Option<i64>) {
    sqlx::query_as(&format!("SELECT {flag}, {column} FROM media WHERE id = ?1"))
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("read media slot")
}
