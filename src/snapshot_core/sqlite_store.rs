//! SQLite-backed snapshot store
//!
//! Each operation opens its own connection (WAL mode), so the store can be
//! shared across threads without a global lock. Multi-query analyses should
//! use [`SqliteSnapshotStore::read_view`] to pin one point-in-time snapshot.
//!
//! Tables (see `/sql/`):
//! - `fund_master` - INSERT OR REPLACE on fund_id
//! - `holdings_snapshots` - UPSERT on (fund_id, collect_date, security_name)

use super::error::StoreError;
use super::schema::run_schema_migrations;
use super::store::{SnapshotReader, SnapshotWriter};
use super::types::{FundInfo, SnapshotRow};
use crate::sqlite_pragma::apply_optimized_pragmas;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// SQLite snapshot store
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    db_path: PathBuf,
}

impl SqliteSnapshotStore {
    /// Open (creating if needed) the database at `db_path` and apply the schema
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        let conn = store.connect()?;
        run_schema_migrations(&conn)?;

        log::info!("✅ Snapshot store ready: {}", store.db_path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        apply_optimized_pragmas(&conn)?;
        Ok(conn)
    }

    /// Open a read-only view pinned to a single point in time
    ///
    /// The view holds a deferred read transaction for its whole lifetime, so
    /// every query it answers sees the same committed state even while the
    /// collector keeps writing.
    pub fn read_view(&self) -> Result<SqliteReadView, StoreError> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA query_only = ON; BEGIN DEFERRED;")?;
        Ok(SqliteReadView { conn })
    }
}

/// Point-in-time read view over the store
pub struct SqliteReadView {
    conn: Connection,
}

impl Drop for SqliteReadView {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            log::debug!("Read view rollback failed: {}", e);
        }
    }
}

fn query_collect_dates(conn: &Connection, limit: usize) -> Result<Vec<NaiveDate>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT collect_date FROM holdings_snapshots
         ORDER BY collect_date DESC
         LIMIT ?1",
    )?;

    let dates = stmt
        .query_map([limit as i64], |row| row.get::<_, NaiveDate>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(dates)
}

fn query_snapshot(
    conn: &Connection,
    fund_id: Option<&str>,
    collect_date: NaiveDate,
) -> Result<Vec<SnapshotRow>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT fund_id, collect_date, security_name, quantity, weight
         FROM holdings_snapshots
         WHERE collect_date = ?1 AND (?2 IS NULL OR fund_id = ?2)
         ORDER BY fund_id, security_name",
    )?;

    let rows = stmt
        .query_map(params![collect_date, fund_id], |row| {
            Ok(SnapshotRow {
                fund_id: row.get(0)?,
                collect_date: row.get(1)?,
                security_name: row.get(2)?,
                quantity: row.get(3)?,
                weight: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_latest_date_for(conn: &Connection, fund_id: &str) -> Result<Option<NaiveDate>, StoreError> {
    let latest: Option<NaiveDate> = conn.query_row(
        "SELECT MAX(collect_date) FROM holdings_snapshots WHERE fund_id = ?1",
        [fund_id],
        |row| row.get(0),
    )?;
    Ok(latest)
}

fn query_average_weight(
    conn: &Connection,
    security_name: &str,
    collect_date: NaiveDate,
) -> Result<Option<f64>, StoreError> {
    let avg: Option<f64> = conn
        .query_row(
            "SELECT AVG(weight) FROM holdings_snapshots
             WHERE security_name = ?1 AND collect_date = ?2",
            params![security_name, collect_date],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    Ok(avg)
}

fn query_fund_names(conn: &Connection) -> Result<HashMap<String, String>, StoreError> {
    let mut stmt = conn.prepare_cached("SELECT fund_id, display_name FROM fund_master")?;
    let names = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(names)
}

impl SnapshotReader for SqliteSnapshotStore {
    fn list_collect_dates(&self, limit: usize) -> Result<Vec<NaiveDate>, StoreError> {
        query_collect_dates(&self.connect()?, limit)
    }

    fn get_snapshot(
        &self,
        fund_id: Option<&str>,
        collect_date: NaiveDate,
    ) -> Result<Vec<SnapshotRow>, StoreError> {
        query_snapshot(&self.connect()?, fund_id, collect_date)
    }

    fn latest_date_for(&self, fund_id: &str) -> Result<Option<NaiveDate>, StoreError> {
        query_latest_date_for(&self.connect()?, fund_id)
    }

    fn average_weight(
        &self,
        security_name: &str,
        collect_date: NaiveDate,
    ) -> Result<Option<f64>, StoreError> {
        query_average_weight(&self.connect()?, security_name, collect_date)
    }

    fn fund_names(&self) -> Result<HashMap<String, String>, StoreError> {
        query_fund_names(&self.connect()?)
    }
}

impl SnapshotReader for SqliteReadView {
    fn list_collect_dates(&self, limit: usize) -> Result<Vec<NaiveDate>, StoreError> {
        query_collect_dates(&self.conn, limit)
    }

    fn get_snapshot(
        &self,
        fund_id: Option<&str>,
        collect_date: NaiveDate,
    ) -> Result<Vec<SnapshotRow>, StoreError> {
        query_snapshot(&self.conn, fund_id, collect_date)
    }

    fn latest_date_for(&self, fund_id: &str) -> Result<Option<NaiveDate>, StoreError> {
        query_latest_date_for(&self.conn, fund_id)
    }

    fn average_weight(
        &self,
        security_name: &str,
        collect_date: NaiveDate,
    ) -> Result<Option<f64>, StoreError> {
        query_average_weight(&self.conn, security_name, collect_date)
    }

    fn fund_names(&self) -> Result<HashMap<String, String>, StoreError> {
        query_fund_names(&self.conn)
    }
}

impl SnapshotWriter for SqliteSnapshotStore {
    fn upsert(&self, rows: &[SnapshotRow]) -> Result<usize, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(
                r#"
                INSERT INTO holdings_snapshots (
                    fund_id, collect_date, security_name, quantity, weight
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(fund_id, collect_date, security_name) DO UPDATE SET
                    quantity = excluded.quantity,
                    weight = excluded.weight
                "#,
            )?;

            for row in rows {
                stmt.execute(params![
                    row.fund_id,
                    row.collect_date,
                    row.security_name,
                    row.quantity,
                    row.weight,
                ])?;
            }
        }

        tx.commit()?;
        log::debug!("💾 Upserted {} snapshot rows", rows.len());
        Ok(rows.len())
    }

    fn seed_funds(&self, funds: &[FundInfo]) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO fund_master (fund_id, display_name) VALUES (?1, ?2)",
            )?;
            for fund in funds {
                stmt.execute(params![fund.fund_id, fund.display_name])?;
            }
        }

        tx.commit()?;
        log::info!("📋 Fund master seeded: {} funds", funds.len());
        Ok(())
    }
}
