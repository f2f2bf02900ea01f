use crate::config::StoreConfig;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;

#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for StoreError {}

/// Gate in front of the read-only sales database. Every operation borrows a
/// permit from a global semaphore, opens its own read-only connection on the
/// blocking pool, and runs one closure against it.
pub struct SalesStore {
    cfg: StoreConfig,
    connections: Arc<Semaphore>,
}

impl SalesStore {
    #[must_use]
    pub fn new(cfg: StoreConfig) -> Arc<Self> {
        Arc::new(Self {
            connections: Arc::new(Semaphore::new(cfg.max_connections)),
            cfg,
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.cfg.db_path
    }

    /// Runs `op` against a fresh read-only connection. Open failures, query
    /// failures, and the operation timeout all surface as [`StoreError`];
    /// the caller decides whether that is a 500 or a soft default.
    pub async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, tilldeck_query::QueryError> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .connections
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        let path = self.cfg.db_path.clone();
        let pragma_sql = format!(
            "PRAGMA query_only=ON; PRAGMA temp_store=MEMORY; PRAGMA cache_size=-{}; PRAGMA mmap_size={};",
            self.cfg.sqlite_pragma_cache_kib, self.cfg.sqlite_pragma_mmap_bytes
        );
        let joined = timeout(
            self.cfg.op_timeout,
            tokio::task::spawn_blocking(move || {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|e| StoreError(e.to_string()))?;
                let _ = conn.set_prepared_statement_cache_capacity(64);
                let _ = conn.execute_batch(&pragma_sql);
                op(&conn).map_err(|e| StoreError(e.to_string()))
            }),
        )
        .await;
        match joined {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(StoreError(join_error.to_string())),
            Err(_) => Err(StoreError("store operation timed out".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection as WritableConnection;

    fn seeded_store(dir: &tempfile::TempDir) -> Arc<SalesStore> {
        let db_path = dir.path().join("sales.sqlite");
        let conn = WritableConnection::open(&db_path).expect("create db");
        conn.execute_batch(
            "CREATE TABLE sales (id INTEGER PRIMARY KEY, customer_name TEXT, date TEXT);
             INSERT INTO sales (id, customer_name, date) VALUES (1, 'Alice', '2024-01-01');",
        )
        .expect("seed");
        SalesStore::new(StoreConfig {
            db_path,
            ..StoreConfig::default()
        })
    }

    #[tokio::test]
    async fn runs_read_only_operations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir);
        let count: i64 = store
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sales", [], |r| r.get(0))
                    .map_err(Into::into)
            })
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn rejects_writes_through_the_read_only_gate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir);
        let result = store
            .with_conn(|conn| {
                conn.execute("DELETE FROM sales", [])
                    .map(|_| ())
                    .map_err(Into::into)
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_database_is_a_store_error() {
        let store = SalesStore::new(StoreConfig {
            db_path: std::path::PathBuf::from("/nonexistent/tilldeck/sales.sqlite"),
            ..StoreConfig::default()
        });
        let result = store
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sales", [], |r| r.get::<_, i64>(0))
                    .map_err(Into::into)
            })
            .await;
        assert!(result.is_err());
    }
}
