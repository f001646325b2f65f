//! Embedded schema migrations
//!
//! The `.sql` files under `/sql/` are compiled into the binary and applied in
//! filename order. Every statement uses `IF NOT EXISTS`, so running the set
//! against an existing database is a no-op.

use super::error::StoreError;
use rusqlite::Connection;

/// Migration files, sorted (00_, 01_, ...)
pub const SCHEMA_MIGRATIONS: &[(&str, &str)] = &[
    ("00_fund_master.sql", include_str!("../../sql/00_fund_master.sql")),
    (
        "01_holdings_snapshots.sql",
        include_str!("../../sql/01_holdings_snapshots.sql"),
    ),
];

/// Run all embedded schema migrations against `conn`
pub fn run_schema_migrations(conn: &Connection) -> Result<(), StoreError> {
    log::info!("🔧 Running {} schema migrations", SCHEMA_MIGRATIONS.len());

    for &(name, sql) in SCHEMA_MIGRATIONS {
        log::debug!("   ├─ Executing: {}", name);
        conn.execute_batch(sql)
            .map_err(|source| StoreError::Migration { name, source })?;
    }

    log::info!("✅ Schema migrations completed");
    Ok(())
}
