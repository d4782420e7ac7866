use crate::db::connection::Database;
use crate::engine::models::ListingRecord;
use crate::errors::ScraperError;
use crate::store::OutputStore;
use rusqlite::{params, OptionalExtension};

/// Listing records kept as JSON rows keyed by listing key.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn load(&self, listing_key: &str) -> Result<Option<ListingRecord>, ScraperError> {
        let json: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT record_json FROM listings WHERE key = ?",
                params![listing_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScraperError::Db(format!("failed to load listing: {e}")))
        })?;

        json.map(|j| serde_json::from_str(&j).map_err(ScraperError::from))
            .transpose()
    }

    pub fn count(&self) -> Result<i64, ScraperError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))
                .map_err(ScraperError::from)
        })
    }
}

impl OutputStore for SqliteStore {
    fn exists(&self, listing_key: &str) -> Result<bool, ScraperError> {
        self.db.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM listings WHERE key = ?",
                    params![listing_key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn write(&self, listing_key: &str, record: &ListingRecord) -> Result<(), ScraperError> {
        let json = serde_json::to_string(record)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO listings (key, url, name, scraped_at, record_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(key) DO UPDATE SET
                    url = excluded.url,
                    name = excluded.name,
                    scraped_at = excluded.scraped_at,
                    record_json = excluded.record_json",
                params![listing_key, record.url, record.name, record.timestamp, json],
            )
            .map_err(|e| ScraperError::Db(format!("failed to save listing: {e}")))?;
            Ok(())
        })?;

        tracing::info!(key = listing_key, "listing saved to database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::init_db;
    use chrono::Local;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Returns a fresh test database using the bundled schema
    fn make_db() -> Database {
        let path = std::env::temp_dir().join(format!(
            "listings_test_{}.sqlite",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let db = Database::new(path);
        init_db(&db).expect("Failed to initialize DB");
        db
    }

    #[test]
    fn write_then_exists_and_load() {
        let store = SqliteStore::new(make_db());
        let mut record = ListingRecord::new(
            "https://www.pulte.com/homes/a/b/c/malind-bluff-210500",
            Local::now().naive_local(),
        );
        record.name = Some("Malind Bluff".into());

        assert!(!store.exists("malind-bluff-210500").unwrap());
        store.write("malind-bluff-210500", &record).unwrap();
        assert!(store.exists("malind-bluff-210500").unwrap());
        assert_eq!(store.load("malind-bluff-210500").unwrap(), Some(record.clone()));

        // Rewriting the same key replaces the row.
        record.name = Some("Malind Bluff II".into());
        store.write("malind-bluff-210500", &record).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(
            store.load("malind-bluff-210500").unwrap().and_then(|r| r.name),
            Some("Malind Bluff II".to_string())
        );
        assert_eq!(store.load("missing").unwrap(), None);
    }
}
