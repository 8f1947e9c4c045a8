//! SQLite-backed document collections.
//!
//! Records are stored as JSON bodies in a single `documents` table tagged by
//! collection. Filters compare top-level fields with `json_extract`, so the
//! record schema is implicit: adding a field needs no migration.

use crate::error::{Result, StoreError};
use crate::records::{Collection, Record};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 1;

/// Maximum retries for database lock errors.
const DB_LOCK_MAX_RETRIES: u32 = 5;

/// Initial delay for database lock retry (in milliseconds).
const DB_LOCK_INITIAL_DELAY_MS: u64 = 50;

/// Maximum delay for database lock retry.
const DB_LOCK_MAX_DELAY: Duration = Duration::from_secs(5);

/// Conjunction of field-equality tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// A filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field == value`.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// SQL fragment and bound parameters, starting after the collection param.
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::new();
        let mut values = Vec::with_capacity(self.clauses.len() * 2);
        for (field, value) in &self.clauses {
            sql.push_str(" AND json_extract(body, ?) IS ?");
            values.push(SqlValue::Text(format!("$.{field}")));
            values.push(sql_value(field, value)?);
        }
        Ok((sql, values))
    }
}

fn sql_value(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(SqlValue::Integer(i)),
            (None, Some(f)) => Ok(SqlValue::Real(f)),
            _ => Err(StoreError::UnsupportedFilter {
                field: field.to_string(),
            }),
        },
        Value::Array(_) | Value::Object(_) => Err(StoreError::UnsupportedFilter {
            field: field.to_string(),
        }),
    }
}

/// Partial field merge applied by [`LocalStore::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    fields: Map<String, Value>,
}

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value` on every matching record.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn apply(&self, body: &mut Map<String, Value>) {
        for (field, value) in &self.fields {
            body.insert(field.clone(), value.clone());
        }
    }
}

/// The local document store.
///
/// Opened once at startup and shared behind an `Arc`. [`LocalStore::close`]
/// releases the connection; every later call fails with [`StoreError::Closed`].
pub struct LocalStore {
    conn: Mutex<Option<Connection>>,
}

impl LocalStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(Some(conn)),
        };
        store.migrate()?;
        info!(path = %path.display(), "opened local store");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(Some(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Close the underlying connection. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::Database(e))?;
                info!("closed local store");
            }
            None => debug!("local store already closed"),
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    /// Execute a database operation with automatic retry on lock errors.
    fn with_retry<T, F>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut(&mut Connection) -> Result<T>,
    {
        let mut attempt = 0;
        let mut delay = Duration::from_millis(DB_LOCK_INITIAL_DELAY_MS);

        loop {
            attempt += 1;

            let outcome = {
                let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
                let conn = guard.as_mut().ok_or(StoreError::Closed)?;
                f(conn)
            };

            match outcome {
                Ok(result) => {
                    if attempt > 1 {
                        info!(attempt, operation, "Store operation succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(ref e) if e.is_database_locked() && attempt <= DB_LOCK_MAX_RETRIES => {
                    warn!(
                        attempt,
                        max_retries = DB_LOCK_MAX_RETRIES,
                        delay_ms = delay.as_millis(),
                        operation,
                        "Store locked, retrying with backoff"
                    );

                    std::thread::sleep(delay);

                    // Exponential backoff with cap
                    delay = std::cmp::min(delay * 2, DB_LOCK_MAX_DELAY);
                }
                Err(e) => {
                    if attempt > 1 {
                        warn!(attempt, operation, error = %e, "Store operation failed after retries");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        self.with_retry("migrate", |conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY
                )",
                [],
            )?;

            let current_version: i32 = conn.query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )?;

            if current_version < SCHEMA_VERSION {
                info!(
                    current = current_version,
                    target = SCHEMA_VERSION,
                    "Running store migrations"
                );
                migration_v1(conn)?;
            }
            Ok(())
        })
    }

    /// Append a record to its collection.
    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        let collection = R::COLLECTION;
        let body = match serde_json::to_value(record)? {
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(StoreError::InvalidRecord {
                    collection: collection.as_str(),
                    message: format!("expected a JSON object, got {other}"),
                });
            }
        };
        let body = serde_json::to_string(&body)?;

        self.with_retry("insert", |conn| {
            conn.execute(
                "INSERT INTO documents (collection, body) VALUES (?1, ?2)",
                params![collection.as_str(), body],
            )?;
            Ok(())
        })?;
        debug!(%collection, "inserted record");
        Ok(())
    }

    /// First record matching `filter`, in insertion order.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub fn find_first<R: Record>(&self, filter: &Filter) -> Result<Option<R>> {
        let rows = self.select_rows(R::COLLECTION, filter)?;
        Ok(rows
            .into_iter()
            .find_map(|(rowid, body)| decode::<R>(R::COLLECTION, rowid, &body)))
    }

    /// Every record matching `filter`, in insertion order.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub fn find_all<R: Record>(&self, filter: &Filter) -> Result<Vec<R>> {
        let rows = self.select_rows(R::COLLECTION, filter)?;
        Ok(rows
            .into_iter()
            .filter_map(|(rowid, body)| decode::<R>(R::COLLECTION, rowid, &body))
            .collect())
    }

    /// Merge `updates` into every record matching `filter`.
    ///
    /// Returns the number of records touched; zero matches is not an error.
    pub fn update<R: Record>(&self, filter: &Filter, updates: &FieldUpdates) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let collection = R::COLLECTION;
        let (where_sql, mut values) = filter.to_sql()?;
        values.insert(0, SqlValue::Text(collection.as_str().to_string()));
        let select = format!("SELECT id, body FROM documents WHERE collection = ?{where_sql}");

        let count = self.with_retry("update", |conn| {
            let tx = conn.transaction()?;
            let rows: Vec<(i64, String)> = {
                let mut stmt = tx.prepare(&select)?;
                let mapped = stmt.query_map(params_from_iter(values.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                mapped.collect::<std::result::Result<_, _>>()?
            };

            let mut touched = 0;
            for (rowid, body) in rows {
                let mut map = match serde_json::from_str::<Value>(&body) {
                    Ok(Value::Object(map)) => map,
                    _ => {
                        warn!(%collection, rowid, "skipping malformed record during update");
                        continue;
                    }
                };
                updates.apply(&mut map);
                let body = serde_json::to_string(&map)?;
                tx.execute(
                    "UPDATE documents SET body = ?1 WHERE id = ?2",
                    params![body, rowid],
                )?;
                touched += 1;
            }
            tx.commit()?;
            Ok(touched)
        })?;

        debug!(%collection, count, "updated records");
        Ok(count)
    }

    /// Remove every record matching `filter`. Returns the number removed.
    pub fn delete<R: Record>(&self, filter: &Filter) -> Result<usize> {
        let collection = R::COLLECTION;
        let (where_sql, mut values) = filter.to_sql()?;
        values.insert(0, SqlValue::Text(collection.as_str().to_string()));
        let sql = format!("DELETE FROM documents WHERE collection = ?{where_sql}");

        let count = self.with_retry("delete", |conn| {
            Ok(conn.execute(&sql, params_from_iter(values.iter()))?)
        })?;
        debug!(%collection, count, "deleted records");
        Ok(count)
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: Collection) -> Result<usize> {
        self.with_retry("count", |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection.as_str()],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(n).unwrap_or_default())
        })
    }

    fn select_rows(&self, collection: Collection, filter: &Filter) -> Result<Vec<(i64, String)>> {
        let (where_sql, mut values) = filter.to_sql()?;
        values.insert(0, SqlValue::Text(collection.as_str().to_string()));
        let sql =
            format!("SELECT id, body FROM documents WHERE collection = ?{where_sql} ORDER BY id");

        self.with_retry("select", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
        })
    }
}

fn decode<R: Record>(collection: Collection, rowid: i64, body: &str) -> Option<R> {
    match serde_json::from_str(body) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(%collection, rowid, error = %e, "skipping undecodable record");
            None
        }
    }
}

/// Migration to version 1: document table.
fn migration_v1(conn: &Connection) -> Result<()> {
    debug!("Running migration v1: documents table");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            body TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection
         ON documents(collection)",
        [],
    )?;

    conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;

    info!("Migration v1 completed");
    Ok(())
}
