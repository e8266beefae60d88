//! Component store
//!
//! SQLite-backed, append-only collection of component records shared by the
//! ingestion tool (writer) and the query service (reader).
//!
//! **Write path:** every append and reset goes through one async write lock
//! per store handle, so concurrent ingestion workers are linearized and no
//! insert is lost or torn. Lock contention caused by *other* processes is
//! retried with exponential backoff up to [`MAX_LOCK_WAIT`].
//!
//! **Read path:** scans run on the pool directly. WAL mode lets them proceed
//! while a write is in flight; a scan only ever sees committed rows.
//!
//! **Lifecycle:** [`ComponentStore::reset`] drops and recreates the table and
//! must be called exactly once, by the ingestion entry point, before any
//! worker starts. Opening a store never resets it.

use crate::model::{Component, ComponentId, ComponentKind, NewComponent};
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// SQLite busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Upper bound on retrying a write blocked by another process
pub const MAX_LOCK_WAIT: Duration = Duration::from_secs(5);

const MAX_CONNECTIONS: u32 = 8;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS components (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK (kind IN ('Module', 'Wire', 'Input', 'Output', 'Assign')),
        name TEXT NOT NULL CHECK (length(name) > 0),
        detail TEXT
    )
"#;

/// Record selection for [`ComponentStore::scan`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    pub kind: Option<ComponentKind>,
}

impl ComponentFilter {
    /// Every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Only records of one kind
    pub fn kind(kind: ComponentKind) -> Self {
        Self { kind: Some(kind) }
    }
}

/// Handle to the persisted component collection
///
/// Cheap to clone; clones share the connection pool and the write lock.
#[derive(Clone)]
pub struct ComponentStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    location: Arc<str>,
}

impl ComponentStore {
    /// Open (creating if needed) the store at `path` for reading and writing.
    ///
    /// Creates the parent directory and the `components` table if missing.
    /// Existing records are kept.
    pub async fn open(path: &Path) -> Result<Self> {
        let location = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::store(
                    format!("create directory {}", parent.display()),
                    sqlx::Error::Io(e),
                )
            })?;
        }

        let newly_created = !path.exists();

        // WAL allows the query service to read while ingestion writes
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| Error::store(format!("open {location}"), e))?;

        if newly_created {
            info!(location = %location, "Created new component store");
        } else {
            info!(location = %location, "Opened existing component store");
        }

        let store = Self::from_pool(pool, location);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Open an existing store without write access.
    ///
    /// Used by the query service; never creates the file or the table.
    pub async fn open_read_only(path: &Path) -> Result<Self> {
        let location = path.display().to_string();

        if !path.exists() {
            return Err(Error::store(
                format!("open {location}"),
                sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "store file does not exist; run chipdb-ingest first",
                )),
            ));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| Error::store(format!("open {location} read-only"), e))?;

        info!(location = %location, "Opened component store (read-only)");
        Ok(Self::from_pool(pool, location))
    }

    /// Open a private in-memory store (single connection, lives as long as the pool)
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::store("open in-memory store", e))?;

        let store = Self::from_pool(pool, ":memory:".to_string());
        store.ensure_schema().await?;
        Ok(store)
    }

    fn from_pool(pool: SqlitePool, location: String) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            location: location.into(),
        }
    }

    /// Human-readable store location (file path or `:memory:`)
    pub fn location(&self) -> &str {
        &self.location
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store("create components table", e))?;
        Ok(())
    }

    /// Discard every record and restart id assignment.
    ///
    /// Must complete before any ingestion worker starts.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::store("reset: begin transaction", e))?;

        sqlx::query("DROP TABLE IF EXISTS components")
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::store("reset: drop components table", e))?;

        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::store("reset: create components table", e))?;

        tx.commit()
            .await
            .map_err(|e| Error::store("reset: commit", e))?;

        info!(location = %self.location, "Component store reset");
        Ok(())
    }

    /// Insert one record and return its assigned id.
    ///
    /// Safe to call concurrently from many tasks; inserts are serialized.
    pub async fn append(&self, record: &NewComponent) -> Result<ComponentId> {
        let _guard = self.write_lock.lock().await;
        let id = retry_on_lock("append component", MAX_LOCK_WAIT, || self.insert(record)).await?;

        debug!(
            id,
            kind = %record.kind(),
            name = record.name(),
            "Appended component"
        );
        Ok(id)
    }

    /// Validate raw fields and append them as one record.
    ///
    /// Invalid input is logged and returned as `InvalidRecord` without
    /// touching the store.
    pub async fn append_fields(
        &self,
        kind: ComponentKind,
        name: &str,
        detail: Option<&str>,
    ) -> Result<ComponentId> {
        let record = match NewComponent::new(kind, name, detail.map(str::to_string)) {
            Ok(record) => record,
            Err(err) => {
                warn!(kind = %kind, name, error = %err, "Rejected component record");
                return Err(err);
            }
        };
        self.append(&record).await
    }

    async fn insert(&self, record: &NewComponent) -> Result<ComponentId> {
        let result = sqlx::query("INSERT INTO components (kind, name, detail) VALUES (?, ?, ?)")
            .bind(record.kind().as_str())
            .bind(record.name())
            .bind(record.detail())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store("append component", e))?;

        Ok(result.last_insert_rowid())
    }

    /// Records matching `filter`, in insertion order.
    pub async fn scan(&self, filter: &ComponentFilter) -> Result<Vec<Component>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, name, detail
            FROM components
            WHERE (?1 IS NULL OR kind = ?1)
            ORDER BY id ASC
            "#,
        )
        .bind(filter.kind.map(|kind| kind.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::store("scan components", e))?;

        rows.iter().map(parse_component_row).collect()
    }

    /// Number of records matching `filter`
    pub async fn count(&self, filter: &ComponentFilter) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM components WHERE (?1 IS NULL OR kind = ?1)")
            .bind(filter.kind.map(|kind| kind.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::store("count components", e))
    }

    /// Close every pooled connection, flushing the WAL into the main file.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_component_row(row: &SqliteRow) -> Result<Component> {
    let decode = |e| Error::store("decode component row", e);

    let id: i64 = row.try_get("id").map_err(decode)?;
    let kind: String = row.try_get("kind").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let detail: Option<String> = row.try_get("detail").map_err(decode)?;

    // Persisted rows are held to the same invariants as new ones
    Ok(NewComponent::parse(&kind, name, detail)?.into_component(id))
}

/// Retry a write while SQLite reports the database locked by another
/// connection, backing off exponentially (10ms doubling, capped at 1s)
/// until `max_wait` elapses. Any other error is returned immediately.
async fn retry_on_lock<F, Fut, T>(operation_name: &str, max_wait: Duration, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let mut attempt = 0u32;
    let mut backoff_ms = 10u64;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Store write succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_lock_contention() {
            return Err(err);
        }

        let elapsed = start_time.elapsed();
        if elapsed >= max_wait {
            warn!(
                operation = operation_name,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "Store write gave up: database still locked"
            );
            return Err(err);
        }

        warn!(
            operation = operation_name,
            attempt,
            backoff_ms,
            "Store locked by another connection, retrying"
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms = (backoff_ms * 2).min(1000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked_error() -> Error {
        Error::store(
            "test",
            sqlx::Error::Protocol("database is locked".to_string()),
        )
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", Duration::from_secs(1), || async {
            Ok::<i32, Error>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_lock() {
        let calls = AtomicU32::new(0);
        let result = retry_on_lock("test_op", Duration::from_secs(1), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(locked_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_other_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_on_lock("test_op", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::InvalidRecord("nope".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidRecord(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_wait() {
        let result: Result<()> =
            retry_on_lock("test_op", Duration::from_millis(30), || async { Err(locked_error()) })
                .await;

        let err = result.unwrap_err();
        assert!(err.is_lock_contention());
    }
}
