use crate::error::StorageError;
use crate::models::{CachedRecord, Facts, Ingredients};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed store of extracted recipes, keyed by source URL.
pub struct ExtractionCache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ExtractionCache {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        log::info!("Opening recipe cache at: {}", path.display());
        let conn = Connection::open(path)?;
        let cache = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        cache.create_tables()?;
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        cache.create_tables()?;
        Ok(cache)
    }

    fn create_tables(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT UNIQUE NOT NULL,
                site TEXT NOT NULL,
                ingredients TEXT NOT NULL,
                method TEXT NOT NULL,
                nutrition TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );",
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Fetch the cached record for `url`.
    ///
    /// Rows whose JSON columns or timestamp no longer parse are reported as a
    /// miss so the page gets scraped again. Only SQLite failures are errors.
    pub fn lookup(&self, url: &str) -> Result<Option<CachedRecord>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT url, site, ingredients, method, nutrition, created_at
                 FROM recipes WHERE url = ?1",
                params![url],
                |row| {
                    Ok(RawRow {
                        url: row.get(0)?,
                        site: row.get(1)?,
                        ingredients: row.get(2)?,
                        method: row.get(3)?,
                        nutrition: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        let Some(raw) = row else {
            return Ok(None);
        };

        match raw.decode() {
            Ok(record) => Ok(Some(record)),
            Err(reason) => {
                log::warn!(
                    "Ignoring unreadable cache row for {}: {}. It will be scraped again.",
                    url,
                    reason
                );
                Ok(None)
            }
        }
    }

    /// Insert or fully replace the row for `record.url`.
    pub fn upsert(&self, record: &CachedRecord) -> Result<(), StorageError> {
        if record.ingredients.main.is_empty() || record.method.is_empty() {
            return Err(StorageError::Incomplete(record.url.clone()));
        }

        let ingredients = serde_json::to_string(&record.ingredients)?;
        let method = serde_json::to_string(&record.method)?;
        let nutrition = record
            .nutrition
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO recipes (url, site, ingredients, method, nutrition, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.url,
                record.site,
                ingredients,
                method,
                nutrition,
                record.created_at.format(TIMESTAMP_FORMAT).to_string()
            ],
        )?;
        log::info!("Saved recipe from {} to cache: {}", record.site, record.url);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

struct RawRow {
    url: String,
    site: String,
    ingredients: String,
    method: String,
    nutrition: Option<String>,
    created_at: Option<String>,
}

impl RawRow {
    fn decode(self) -> Result<CachedRecord, String> {
        let ingredients: Ingredients =
            serde_json::from_str(&self.ingredients).map_err(|e| format!("ingredients: {}", e))?;
        let method: Vec<String> =
            serde_json::from_str(&self.method).map_err(|e| format!("method: {}", e))?;
        let nutrition: Option<Facts> = match self.nutrition.as_deref() {
            None | Some("null") => None,
            Some(json) => Some(serde_json::from_str(json).map_err(|e| format!("nutrition: {}", e))?),
        };
        let created_at = match self.created_at.as_deref() {
            Some(ts) => NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
                .map_err(|e| format!("created_at: {}", e))?,
            None => return Err("created_at: missing".to_string()),
        };

        if ingredients.main.is_empty() || method.is_empty() {
            return Err("stored result is incomplete".to_string());
        }

        Ok(CachedRecord {
            url: self.url,
            site: self.site,
            ingredients,
            method,
            nutrition,
            created_at,
        })
    }
}
