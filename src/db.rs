use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::ScrapeError;
use crate::extract::Record;

pub const DB_PATH: &str = "data/prices.sqlite";

/// Schema the write statement is rendered against. "main" is the
/// connection's own database; an ATTACH-ed database can be targeted by
/// passing its name instead.
pub const DEFAULT_PREFIX: &str = "main";

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Idempotent: re-running against an existing table is a no-op.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS price (
            id           TEXT PRIMARY KEY,
            link         TEXT NOT NULL,
            name         TEXT NOT NULL,
            price        INTEGER NOT NULL,
            time_created INTEGER NOT NULL
        );
        ",
    )?;
    Ok(())
}

// ── Batch write ──

const WRITE_TEMPLATE: &str = "INSERT OR REPLACE INTO {prefix}.price \
     (id, link, name, price, time_created) VALUES (?1, ?2, ?3, ?4, ?5)";

/// The bulk write statement, rendered once at startup from the schema prefix
/// and passed into every batch. The template itself is fixed; only the
/// prefix varies.
pub struct WriteQuery {
    sql: String,
}

impl WriteQuery {
    pub fn new(prefix: &str) -> Self {
        Self {
            sql: WRITE_TEMPLATE.replace("{prefix}", prefix),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Write a batch of records in one transaction. Each record gets a freshly
/// generated UUID, so replace-on-id only fires on an accidental collision
/// and repeated runs append new observations instead of failing. All rows
/// of a batch share one capture timestamp. Any failure rolls the whole
/// batch back; no partial writes.
pub fn upsert_records(
    conn: &Connection,
    query: &WriteQuery,
    records: &[Record],
) -> Result<usize, ScrapeError> {
    // Zero-record batches are legal and skipped outright
    if records.is_empty() {
        return Ok(0);
    }

    let time_created = Utc::now().timestamp() as u64;
    let tx = conn.unchecked_transaction()?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(query.sql())?;
        for record in records {
            let id = Uuid::new_v4().to_string();
            written += stmt.execute(rusqlite::params![
                id,
                record.link,
                record.name,
                record.price,
                time_created,
            ])?;
        }
    }
    tx.commit()?;
    Ok(written)
}

// ── Stats ──

pub struct Stats {
    pub rows: usize,
    pub latest_capture: Option<i64>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let rows: usize = conn.query_row("SELECT COUNT(*) FROM price", [], |r| r.get(0))?;
    let latest_capture: Option<i64> =
        conn.query_row("SELECT MAX(time_created) FROM price", [], |r| r.get(0))?;
    Ok(Stats {
        rows,
        latest_capture,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(link: &str, price: u32) -> Record {
        Record {
            link: link.to_string(),
            name: format!("Ноутбук {}", link),
            price,
        }
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let conn = test_conn();
        let query = WriteQuery::new(DEFAULT_PREFIX);
        assert_eq!(upsert_records(&conn, &query, &[]).unwrap(), 0);
        assert_eq!(get_stats(&conn).unwrap().rows, 0);
    }

    #[test]
    fn batch_commits_every_record_with_distinct_ids() {
        let conn = test_conn();
        let query = WriteQuery::new(DEFAULT_PREFIX);
        let records: Vec<Record> = (0..5)
            .map(|i| record(&format!("/product/{}", i), 1000 + i))
            .collect();
        assert_eq!(upsert_records(&conn, &query, &records).unwrap(), 5);

        let distinct_ids: usize = conn
            .query_row("SELECT COUNT(DISTINCT id) FROM price", [], |r| r.get(0))
            .unwrap();
        assert_eq!(distinct_ids, 5);

        // one capture timestamp per batch
        let distinct_times: usize = conn
            .query_row("SELECT COUNT(DISTINCT time_created) FROM price", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(distinct_times, 1);
    }

    #[test]
    fn failed_batch_leaves_no_rows() {
        let conn = test_conn();
        // Force a failure partway through the batch
        conn.execute_batch(
            "CREATE TRIGGER reject_expensive BEFORE INSERT ON price
             WHEN NEW.price > 5000 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let query = WriteQuery::new(DEFAULT_PREFIX);
        let records = vec![
            record("/product/a", 1000),
            record("/product/b", 2000),
            record("/product/c", 9000),
            record("/product/d", 3000),
        ];
        let err = upsert_records(&conn, &query, &records);
        assert!(matches!(err, Err(ScrapeError::Persistence(_))));
        assert_eq!(get_stats(&conn).unwrap().rows, 0);
    }

    #[test]
    fn stats_reflect_latest_capture() {
        let conn = test_conn();
        let query = WriteQuery::new(DEFAULT_PREFIX);
        assert!(get_stats(&conn).unwrap().latest_capture.is_none());

        upsert_records(&conn, &query, &[record("/product/x", 100)]).unwrap();
        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.rows, 1);
        assert!(stats.latest_capture.is_some());
    }

    #[test]
    fn fixture_pipeline_end_to_end() {
        let html = std::fs::read_to_string("tests/fixtures/catalog.html").unwrap();
        let records = extract::extract_records(&html).unwrap();
        assert_eq!(records.len(), 3);
        let prices: Vec<u32> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![4_200_000, 0, 1_599_900]);

        let conn = test_conn();
        let query = WriteQuery::new(DEFAULT_PREFIX);
        assert_eq!(upsert_records(&conn, &query, &records).unwrap(), 3);

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.rows, 3);
    }
}
