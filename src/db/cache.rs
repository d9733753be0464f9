use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::Database;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid datetime '{value}'"))
}

impl Database {
    pub async fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT key, value, updated_at FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .with_context(|| "failed to read cache entry")?;

            row.map(|(key, value, updated_at)| -> Result<CacheEntry> {
                Ok(CacheEntry {
                    key,
                    value,
                    updated_at: parse_datetime(&updated_at)?,
                })
            })
            .transpose()
        })
        .await
    }

    /// Insert or replace the entry stored under `key`.
    pub async fn put_cache_entry(
        &self,
        key: &str,
        value: String,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO cache_entries (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, updated_at.to_rfc3339()],
            )
            .with_context(|| "failed to write cache entry")?;
            Ok(())
        })
        .await
    }
}
