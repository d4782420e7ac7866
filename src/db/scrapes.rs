use crate::engine::assembler::BatchSummary;
use crate::errors::ScraperError;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub struct ScrapeRun {
    pub id: i64,
    pub source: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub listings_total: Option<i64>,
    pub processed: Option<i64>,
    pub skipped: Option<i64>,
    pub failed: Option<i64>,
    pub success: bool,
}

pub fn start_scrape_run(conn: &Connection, source: &str, now: i64) -> Result<i64, ScraperError> {
    conn.execute(
        "INSERT INTO scrape_runs (source, started_at, success) VALUES (?, ?, 0)",
        params![source, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn end_scrape_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    total: usize,
    summary: &BatchSummary,
) -> Result<(), ScraperError> {
    conn.execute(
        "UPDATE scrape_runs SET finished_at = ?, listings_total = ?, processed = ?, skipped = ?, failed = ?, success = ? WHERE id = ?",
        params![
            now,
            total as i64,
            summary.processed as i64,
            summary.skipped as i64,
            summary.failed as i64,
            summary.failed == 0,
            run_id
        ],
    )?;
    Ok(())
}

pub fn get_recent_scrapes(conn: &Connection) -> Result<Vec<ScrapeRun>, ScraperError> {
    let mut stmt = conn.prepare(
        "SELECT id, source, started_at, finished_at, listings_total, processed, skipped, failed, success FROM scrape_runs ORDER BY started_at DESC, id DESC LIMIT 50",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ScrapeRun {
            id: row.get(0)?,
            source: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            listings_total: row.get(4)?,
            processed: row.get(5)?,
            skipped: row.get(6)?,
            failed: row.get(7)?,
            success: row.get(8)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}
