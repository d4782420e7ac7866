use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::ScraperError;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<PathBuf, Connection>> = RefCell::new(HashMap::new());
}

#[derive(Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides this thread's connection to the closure, opening it on first use.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ScraperError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ScraperError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| ScraperError::Db(format!("Open DB failed: {e}")))?;
                    slots.insert(self.path.clone(), conn);
                }
                match slots.get_mut(&self.path) {
                    Some(conn) => f(conn),
                    None => Err(ScraperError::Db("connection slot missing".into())),
                }
            })
            .map_err(|_| ScraperError::Db("thread-local connection unavailable".into()))?
    }
}

/// Applies the bundled schema.
pub fn init_db(db: &Database) -> Result<(), ScraperError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA)
            .map_err(|e| ScraperError::Db(format!("Failed to apply schema: {e}")))
    })?;

    tracing::info!(path = %db.path().display(), "database initialized");
    Ok(())
}
