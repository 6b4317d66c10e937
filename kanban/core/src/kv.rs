//! Embedded key-value engine backing both stores.
//!
//! Everything lives in a single SQLite file with one `kv` table. Callers work
//! with string keys and opaque byte values, and group reads and writes into
//! closure-scoped transactions through [`KvStore::view`] and
//! [`KvStore::update`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use tracing::info;

use crate::error::StoreError;

const DB_FILE_NAME: &str = "kanban.db";

/// Shared handle to the key-value database.
///
/// Cloning is cheap; every clone talks to the same connection.
#[derive(Clone)]
pub struct KvStore {
    conn: Arc<Mutex<Connection>>,
}

/// A read or write transaction handed to [`KvStore::view`] and
/// [`KvStore::update`] closures.
pub struct KvTxn<'conn> {
    tx: Transaction<'conn>,
}

impl KvStore {
    /// Opens (creating if needed) the database under `base_dir`.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;
        let db_path = base_dir.join(DB_FILE_NAME);
        info!("Opening database at: {}", db_path.display());

        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Opens a private in-memory database. Nothing is written to disk.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS kv (
              key TEXT PRIMARY KEY NOT NULL,
              value BLOB NOT NULL
            ) WITHOUT ROWID;
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Reads a single value outside of any caller-managed transaction.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.view(|txn| txn.get(key))
    }

    /// Runs `f` inside a read transaction.
    pub fn view<T>(
        &self,
        f: impl FnOnce(&KvTxn<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run(TransactionBehavior::Deferred, f)
    }

    /// Runs `f` inside a write transaction.
    ///
    /// The write lock is taken when the transaction begins, so a check made
    /// inside `f` still holds when `f` writes. The transaction commits when
    /// `f` returns `Ok` and rolls back when it returns `Err`.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&KvTxn<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run(TransactionBehavior::Immediate, f)
    }

    fn run<T>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&KvTxn<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock();
        let txn = KvTxn {
            tx: conn.transaction_with_behavior(behavior)?,
        };
        let value = f(&txn)?;
        txn.tx.commit()?;
        Ok(value)
    }
}

impl KvTxn<'_> {
    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .tx
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Returns whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .tx
            .query_row("SELECT 1 FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
