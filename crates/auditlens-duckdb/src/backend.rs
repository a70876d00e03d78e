use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use duckdb::{Connection, Statement};
use tokio::sync::Mutex;
use tracing::info;

use auditlens_core::period::DateRange;

use crate::schema::init_sql;

/// A DuckDB backend for the analytics core.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so every
/// statement runs serialised while the struct stays cheap to share across
/// Axum handlers.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
    /// Read statements prepared since open. Lets tests assert query budgets.
    queries: AtomicU64,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self::from_connection(conn))
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only: data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            queries: AtomicU64::new(0),
        }
    }

    /// Prepare a read statement and count it towards [`Self::queries_issued`].
    pub(crate) fn prepare<'c>(&self, conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(conn.prepare(sql)?)
    }

    /// Number of read statements prepared so far.
    pub fn queries_issued(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

/// Timestamp literal accepted by DuckDB for `TIMESTAMP` columns (UTC).
pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// `(start, end)` parameters for an inclusive window predicate.
pub(crate) fn window(range: &DateRange) -> (String, String) {
    (ts(&range.start), ts(&range.end))
}
