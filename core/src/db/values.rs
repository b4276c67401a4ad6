use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use sea_orm::{sea_query::Value, DbErr, QueryResult};
use serde::Serialize;
use std::fmt;

use crate::error::{EngineError, Result};

/// Storage class of a column, derived from its declared SQLite type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Integer,
    Real,
    Boolean,
    Temporal,
    Text,
    Blob,
    Any,
}

impl ColumnKind {
    pub fn from_declared(declared: &str) -> Self {
        let t = declared.to_ascii_uppercase();
        let has = |needles: &[&str]| needles.iter().any(|n| t.contains(n));
        if has(&["DATE", "TIME"]) {
            ColumnKind::Temporal
        } else if has(&["BOOL"]) {
            ColumnKind::Boolean
        } else if has(&["INT"]) {
            ColumnKind::Integer
        } else if has(&["REAL", "FLOA", "DOUB", "DEC", "NUM", "MONEY"]) {
            ColumnKind::Real
        } else if has(&["CHAR", "CLOB", "TEXT", "STRING", "JSON"]) {
            ColumnKind::Text
        } else if has(&["BLOB"]) {
            ColumnKind::Blob
        } else {
            ColumnKind::Any
        }
    }

    /// Converts operator text into a bindable value.
    ///
    /// Blank input on a non-text column becomes NULL.
    pub fn bind(&self, column: &str, raw: &str) -> Result<Value> {
        let s = raw.trim();
        if s.is_empty() && !matches!(self, ColumnKind::Text | ColumnKind::Any) {
            return Ok(Value::String(None));
        }
        match self {
            ColumnKind::Integer => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(column, "an integer", raw)),
            ColumnKind::Real => s
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::from)
                .ok_or_else(|| invalid(column, "a number", raw)),
            ColumnKind::Boolean => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(Value::from(true)),
                "0" | "false" | "no" => Ok(Value::from(false)),
                _ => Err(invalid(column, "a boolean", raw)),
            },
            ColumnKind::Temporal => {
                if is_temporal(s) {
                    Ok(Value::from(s.to_owned()))
                } else {
                    Err(invalid(column, "a date or timestamp", raw))
                }
            }
            ColumnKind::Blob => Ok(Value::from(raw.as_bytes().to_vec())),
            ColumnKind::Text | ColumnKind::Any => Ok(Value::from(raw.to_owned())),
        }
    }
}

fn invalid(column: &str, expected: &str, raw: &str) -> EngineError {
    EngineError::Validation(format!(
        "column '{}' expects {}, got '{}'",
        column, expected, raw
    ))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn is_temporal(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(s, f).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall-clock time as stored in timestamp columns, whole seconds.
pub fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One value of a result row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// SQLite values are dynamically typed, so probe the storage classes in turn.
    pub fn from_row(row: &QueryResult, idx: usize) -> Result<Cell, DbErr> {
        if let Ok(v) = row.try_get_by_index::<Option<i64>>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::Integer));
        }
        if let Ok(v) = row.try_get_by_index::<Option<f64>>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::Real));
        }
        if let Ok(v) = row.try_get_by_index::<Option<String>>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::Text));
        }
        row.try_get_by_index::<Option<Vec<u8>>>(idx)
            .map(|v| v.map_or(Cell::Null, Cell::Blob))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
            Cell::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn from_rows(columns: Vec<String>, rows: Vec<QueryResult>) -> Result<Self, DbErr> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(Cell::from_row(&row, idx)?);
            }
            out.push(cells);
        }
        Ok(ResultSet { columns, rows: out })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }
}
