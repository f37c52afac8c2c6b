use crate::{
    error::{ApiError, Result},
    models::{HistoryEntry, NewHistoryEntry},
};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    title TEXT NOT NULL,
    short_recommendation TEXT,
    detailed_summary TEXT,
    created_at TEXT NOT NULL
)
"#;

/// Append-only log of queries and the recommendations produced for them.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    pool: SqlitePool,
}

impl HistoryLedger {
    /// Open (creating if needed) the database at `database_url` and make
    /// sure the history table exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.init_schema().await?;
        info!("History ledger ready at {}", database_url);
        Ok(ledger)
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let ledger = Self { pool };
        ledger.init_schema().await?;
        Ok(ledger)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let stored = sqlx::query_as::<_, HistoryEntry>(
            "INSERT INTO history (query, title, short_recommendation, detailed_summary, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, query, title, short_recommendation, detailed_summary, created_at",
        )
        .bind(&entry.query)
        .bind(&entry.title)
        .bind(&entry.short_recommendation)
        .bind(&entry.detailed_summary)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!("Appended history entry {} ('{}')", stored.id, stored.title);
        Ok(stored)
    }

    /// Newest first; entries sharing a timestamp come back in reverse
    /// insertion order.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT id, query, title, short_recommendation, detailed_summary, created_at \
             FROM history ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("History entry {} not found", id)));
        }

        debug!("Deleted history entry {}", id);
        Ok(())
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await?;

        info!("Cleared {} history entries", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
