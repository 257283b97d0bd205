use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;

/// Tables the application expects to find after migrations.
pub const EXPECTED_TABLES: &[&str] = &["media", "pages", "settings", "stories", "story_images"];

/// Comparison of the live schema with [`EXPECTED_TABLES`].
#[derive(Debug, Clone, Serialize, TS)]
pub struct TableReport {
    pub existing: Vec<String>,
    pub expected: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub all_present: bool,
}

impl TableReport {
    fn compare(existing: Vec<String>) -> Self {
        let missing: Vec<String> = EXPECTED_TABLES
            .iter()
            .filter(|name| !existing.iter().any(|t| t == *name))
            .map(|name| name.to_string())
            .collect();
        let extra = existing
            .iter()
            .filter(|t| !EXPECTED_TABLES.contains(&t.as_str()))
            .cloned()
            .collect();

        TableReport {
            all_present: missing.is_empty(),
            expected: EXPECTED_TABLES.iter().map(|s| s.to_string()).collect(),
            existing,
            missing,
            extra,
        }
    }
}

/// List user tables, skipping SQLite internals and the migrations ledger.
pub async fn table_report(pool: &SqlitePool) -> Result<TableReport, sqlx::Error> {
    let existing: Vec<String> = sqlx::query_scalar(
        r#"SELECT name FROM sqlite_master
           WHERE type = 'table'
             AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
             AND name NOT LIKE '\_sqlx\_%' ESCAPE '\'
           ORDER BY name"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(TableReport::compare(existing))
}
