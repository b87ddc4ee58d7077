use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags, ToSql};
use tracing::debug;

use super::filters::Param;
use super::query::Statement;
use super::warehouse::{Cell, Row, StoreError, Warehouse};
use crate::config::WarehouseConfig;

/// Reporting views stored in a SQLite file, read through a fresh connection per call.
#[derive(Debug, Clone)]
pub struct SqliteWarehouse {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteWarehouse {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self::new(config.path.clone(), config.busy_timeout)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|err| {
            StoreError::Unavailable(format!("{}: {err}", self.path.display()))
        })?;
        conn.busy_timeout(self.busy_timeout).map_err(classify)?;
        Ok(conn)
    }
}

impl Warehouse for SqliteWarehouse {
    fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let conn = self.connect()?;
        let mut prepared = conn.prepare(&statement.sql).map_err(classify)?;
        let width = prepared.column_count();

        let mut rows = prepared
            .query(params_from_iter(statement.params.iter()))
            .map_err(classify)?;

        let mut fetched = Vec::new();
        while let Some(row) = rows.next().map_err(classify)? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(Cell::from(row.get_ref(index).map_err(classify)?));
            }
            fetched.push(Row::new(cells));
        }

        debug!(rows = fetched.len(), "warehouse statement completed");
        Ok(fetched)
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(classify)?;
        Ok(())
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Int(value) => ToSqlOutput::from(*value),
            Param::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(value) => Cell::Integer(value),
            ValueRef::Real(value) => Cell::Real(value),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Cell::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn classify(err: rusqlite::Error) -> StoreError {
    let message = err.to_string();
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
            ) =>
        {
            StoreError::Unavailable(message)
        }
        _ if message.contains("no such table") => StoreError::MissingView(message),
        _ => StoreError::Query(message),
    }
}
