//! SQLite store for the e-commerce data the assistant answers from.
//!
//! Uses `rusqlite` in synchronous mode; statements run on tokio's blocking
//! pool so a slow query never stalls the runtime. The store executes whatever
//! text it is given. It does not parse or validate SQL: opening read-only is
//! the only guard, and a rejected statement surfaces as an ordinary error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Number, Value};

use super::errors::StoreError;
use super::schema::STORE_SCHEMA;
use crate::chat::gateway::DataGateway;
use crate::chat::types::Row;

// ─── Database ───────────────────────────────────────────────────────────────

/// SQLite handle for the store.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct StoreDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl StoreDatabase {
    /// Open the store at the given path.
    ///
    /// With `read_only`, SQLite itself refuses any write statement. Pass
    /// `":memory:"` (and `read_only = false`) for an in-memory store (tests).
    pub fn open(path: &str, read_only: bool) -> Result<Self, StoreError> {
        let conn = if read_only {
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
            )?
        } else {
            Connection::open(path)?
        };

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        tracing::info!(path, read_only, "store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create the e-commerce tables if they don't exist.
    pub fn bootstrap_schema(&self) -> Result<(), StoreError> {
        self.execute_script(STORE_SCHEMA)?;
        tracing::info!("store schema bootstrapped");
        Ok(())
    }

    /// Run a batch of statements that return no rows.
    pub fn execute_script(&self, sql: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run one statement and collect its rows.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            query_rows(&conn, &sql)
        })
        .await?
    }
}

#[async_trait]
impl DataGateway for StoreDatabase {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        self.query(sql).await
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    conn.lock().map_err(|e| StoreError::DatabaseError {
        reason: format!("connection lock poisoned: {e}"),
    })
}

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

/// Map a SQLite value to JSON for the summarizer prompt.
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
