use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::{types::ValueRef, Connection};
use serde_json::Value;
use tracing::{debug, info};
use vizbee_core::ConnectionConfig;

use crate::error::{DbError, Result};
use crate::result::QueryResult;

/// One open database, shared read-only between datasets.
///
/// The `Mutex` only makes the handle `Sync`; queries run one at a time on the
/// agent's single task, so it is never contended.
pub struct Database {
    name: String,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

impl Database {
    /// Open the database behind `url`.
    pub fn open(name: &str, url: &str) -> Result<Self> {
        let conn = match sqlite_path(name, url)? {
            Some(path) => Connection::open(&path),
            None => Connection::open_in_memory(),
        }
        .map_err(|source| DbError::Open {
            name: name.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Run a single statement and collect every row.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Poisoned(self.name.clone()))?;

        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query([])?;
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(to_json(row.get_ref(i)?));
            }
            data.push(values);
        }

        debug!(connection = %self.name, rows = data.len(), "query executed");
        Ok(QueryResult::new(columns, data))
    }

    /// Run one or more statements that return no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Poisoned(self.name.clone()))?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}

/// Resolve a SQLAlchemy-style SQLite URL. `None` means in-memory.
///
/// `sqlite:///data.db` → `data.db`, `sqlite:////var/data.db` → `/var/data.db`.
fn sqlite_path(name: &str, url: &str) -> Result<Option<PathBuf>> {
    let malformed = |reason: &str| DbError::MalformedUrl {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| malformed("expected `<scheme>://...`"))?;

    // `sqlite+pysqlite://` and friends name a driver we do not need.
    let dialect = scheme.split('+').next().unwrap_or_default();
    if dialect != "sqlite" {
        return Err(DbError::UnsupportedScheme {
            name: name.to_string(),
            scheme: scheme.to_string(),
        });
    }

    let rest = rest.split('?').next().unwrap_or_default();
    if rest.is_empty() {
        return Ok(None);
    }
    let path = rest
        .strip_prefix('/')
        .ok_or_else(|| malformed("sqlite urls take no host"))?;

    match path {
        "" | ":memory:" => Ok(None),
        p => Ok(Some(PathBuf::from(p))),
    }
}

/// Every configured connection, keyed by name.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    databases: HashMap<String, Arc<Database>>,
}

impl ConnectionRegistry {
    /// Open every configured connection. Stops at the first failure; no
    /// partially built registry is ever returned.
    pub fn open(connections: &[ConnectionConfig]) -> Result<Self> {
        let mut databases = HashMap::with_capacity(connections.len());
        for c in connections {
            let db = Database::open(&c.name, &c.url)?;
            info!(connection = %c.name, "connection opened");
            databases.insert(c.name.clone(), Arc::new(db));
        }
        Ok(Self { databases })
    }

    pub fn get(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}
