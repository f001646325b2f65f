//! Shared SQLite PRAGMA setup
//!
//! Every connection (writer or reader) goes through `apply_optimized_pragmas`
//! so WAL mode is on before the first statement runs. WAL is what lets the
//! collector write one fund's day while analysis readers keep their own
//! consistent view.

use rusqlite::Connection;
use std::time::Duration;

/// How long a connection waits on a locked database before giving up
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply WAL + tuned PRAGMAs to a connection
///
/// - `journal_mode = WAL` (one writer, many readers)
/// - `synchronous = NORMAL` (safe with WAL)
/// - `temp_store = MEMORY`
/// - `foreign_keys = ON`
/// - busy timeout of [`BUSY_TIMEOUT`]
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
