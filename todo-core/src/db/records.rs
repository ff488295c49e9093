//! Table-name driven access to rows as JSON objects.
//!
//! Pipe steps address data by a public table name (`todo-items`) and a store
//! key rather than by a Rust type, so this layer maps JSON objects onto the
//! columns a table declares and back.

use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value as SqlValue, OptionalExtension, Row};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::models::{parse_flag, MAX_TEXT_LEN};

/// A row as a JSON object.
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("no record with id {id} in '{table}'")]
    NotFound { table: String, id: Uuid },
    #[error("invalid record for '{table}': {message}")]
    Invalid { table: String, message: String },
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text { max_len: usize },
    Bool { default: bool },
}

#[derive(Debug)]
struct Column {
    name: &'static str,
    kind: ColumnKind,
}

/// A table reachable through the record layer. Every table has a UUID `id`
/// and an insert-time `created_at` besides its declared columns.
#[derive(Debug)]
pub(crate) struct TableSpec {
    name: &'static str,
    sql_name: &'static str,
    columns: &'static [Column],
}

static TABLES: &[TableSpec] = &[TableSpec {
    name: "todo-items",
    sql_name: "todo_items",
    columns: &[
        Column {
            name: "text",
            kind: ColumnKind::Text {
                max_len: MAX_TEXT_LEN,
            },
        },
        Column {
            name: "done",
            kind: ColumnKind::Bool { default: false },
        },
    ],
}];

impl TableSpec {
    fn lookup(name: &str) -> Result<&'static TableSpec, RecordError> {
        TABLES
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| RecordError::UnknownTable(name.to_string()))
    }

    fn select_sql(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        format!(
            "SELECT id, created_at, {} FROM {}",
            columns.join(", "),
            self.sql_name
        )
    }

    fn record_from_row(&self, row: &Row<'_>) -> rusqlite::Result<Record> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(1)?;

        let mut record = Record::new();
        record.insert("id".into(), Value::String(parse_uuid(0, &id)?.to_string()));
        record.insert(
            "created_at".into(),
            Value::String(format_timestamp(&parse_timestamp(1, &created_at)?)),
        );
        for (i, column) in self.columns.iter().enumerate() {
            let value = match column.kind {
                ColumnKind::Text { .. } => Value::String(row.get(i + 2)?),
                ColumnKind::Bool { .. } => Value::Bool(row.get(i + 2)?),
            };
            record.insert(column.name.into(), value);
        }
        Ok(record)
    }

    fn invalid(&self, message: impl Into<String>) -> RecordError {
        RecordError::Invalid {
            table: self.name.to_string(),
            message: message.into(),
        }
    }

    fn coerce(&self, column: &Column, value: &Value) -> Result<SqlValue, RecordError> {
        match (column.kind, value) {
            (ColumnKind::Text { max_len }, Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(self.invalid(format!("{} must not be blank", column.name)));
                }
                if trimmed.chars().count() > max_len {
                    return Err(self.invalid(format!(
                        "{} must be at most {} characters",
                        column.name, max_len
                    )));
                }
                Ok(SqlValue::Text(trimmed.to_string()))
            }
            (ColumnKind::Bool { .. }, Value::Bool(b)) => Ok(SqlValue::Integer(i64::from(*b))),
            (ColumnKind::Bool { .. }, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(SqlValue::Integer(0)),
                Some(1) => Ok(SqlValue::Integer(1)),
                _ => Err(self.invalid(format!("{} must be a boolean", column.name))),
            },
            (ColumnKind::Bool { .. }, Value::String(s)) => parse_flag(s)
                .map(|b| SqlValue::Integer(i64::from(b)))
                .ok_or_else(|| self.invalid(format!("{} must be a boolean", column.name))),
            (ColumnKind::Text { .. }, _) => {
                Err(self.invalid(format!("{} must be a string", column.name)))
            }
            (ColumnKind::Bool { .. }, _) => {
                Err(self.invalid(format!("{} must be a boolean", column.name)))
            }
        }
    }

    fn record_id(&self, record: &Record) -> Result<Option<Uuid>, RecordError> {
        match record.get("id") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| self.invalid(format!("'{}' is not a valid id", raw))),
            Some(_) => Err(self.invalid("id must be a string")),
        }
    }
}

impl Database {
    pub fn select_records(&self, table: &str) -> Result<Vec<Record>, RecordError> {
        let spec = TableSpec::lookup(table)?;
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            spec.select_sql()
        ))?;
        let records = stmt
            .query_map([], |row| spec.record_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn select_record(&self, table: &str, id: Uuid) -> Result<Option<Record>, RecordError> {
        let spec = TableSpec::lookup(table)?;
        let record = self
            .lock()
            .query_row(
                &format!("{} WHERE id = ?1", spec.select_sql()),
                params![id.to_string()],
                |row| spec.record_from_row(row),
            )
            .optional()?;
        Ok(record)
    }

    /// Inserts the record when it carries no `id`, otherwise updates the
    /// fields it carries. Fields the table does not declare are ignored.
    pub fn save_record(
        &self,
        table: &str,
        record: &Record,
    ) -> Result<(Uuid, SaveOutcome), RecordError> {
        let spec = TableSpec::lookup(table)?;
        match spec.record_id(record)? {
            None => self.insert_record(spec, record),
            Some(id) => self.update_record(spec, id, record),
        }
    }

    pub fn delete_record(&self, table: &str, id: Uuid) -> Result<bool, RecordError> {
        let spec = TableSpec::lookup(table)?;
        let changed = self.lock().execute(
            &format!("DELETE FROM {} WHERE id = ?1", spec.sql_name),
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn insert_record(
        &self,
        spec: &TableSpec,
        record: &Record,
    ) -> Result<(Uuid, SaveOutcome), RecordError> {
        let id = Uuid::new_v4();
        let mut names = vec!["id", "created_at"];
        let mut values = vec![
            SqlValue::Text(id.to_string()),
            SqlValue::Text(format_timestamp(&Utc::now())),
        ];

        for column in spec.columns {
            let value = match (record.get(column.name), column.kind) {
                (Some(value), _) => spec.coerce(column, value)?,
                (None, ColumnKind::Bool { default }) => SqlValue::Integer(i64::from(default)),
                (None, ColumnKind::Text { .. }) => {
                    return Err(spec.invalid(format!("{} is required", column.name)))
                }
            };
            names.push(column.name);
            values.push(value);
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        self.lock().execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                spec.sql_name,
                names.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(values),
        )?;
        tracing::debug!(table = spec.name, %id, "inserted record");

        Ok((id, SaveOutcome::Inserted))
    }

    fn update_record(
        &self,
        spec: &TableSpec,
        id: Uuid,
        record: &Record,
    ) -> Result<(Uuid, SaveOutcome), RecordError> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for column in spec.columns {
            if let Some(value) = record.get(column.name) {
                values.push(spec.coerce(column, value)?);
                assignments.push(format!("{} = ?{}", column.name, values.len()));
            }
        }

        let conn = self.lock();
        let changed = if assignments.is_empty() {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", spec.sql_name),
                params![id.to_string()],
                |row| row.get::<_, i64>(0),
            )?
        } else {
            values.push(SqlValue::Text(id.to_string()));
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                spec.sql_name,
                assignments.join(", "),
                values.len()
            );
            conn.execute(&sql, params_from_iter(values))? as i64
        };

        if changed == 0 {
            return Err(RecordError::NotFound {
                table: spec.name.to_string(),
                id,
            });
        }
        tracing::debug!(table = spec.name, %id, "updated record");

        Ok((id, SaveOutcome::Updated))
    }
}
