use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use todo_core::SaveOutcome;

use super::{record_id, table_key, JsonReady};
use crate::pipe::{Flow, PipeError, PipeResponse, Step, StepContext, StepKind, Store};

/// Saves the object at `data_field` into `table`.
///
/// Objects without an `id` are inserted and the new id is published under
/// `<table>_insert`; objects with one update that record and publish
/// `<table>_update`.
#[derive(Debug)]
pub struct DatabaseWrite {
    table: String,
    data_field: String,
}

impl DatabaseWrite {
    pub fn new(table: impl Into<String>, data_field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            data_field: data_field.into(),
        }
    }
}

impl Step for DatabaseWrite {
    fn name(&self) -> &str {
        "database_write"
    }

    fn kind(&self) -> StepKind {
        StepKind::Loader
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let record = match store.get(&self.data_field) {
            Some(Value::Object(record)) => record,
            Some(_) => {
                return Err(PipeError::Invalid(format!(
                    "'{}' is not an object",
                    self.data_field
                )))
            }
            None => return Err(PipeError::MissingField(self.data_field.clone())),
        };

        let (id, outcome) = ctx.db.save_record(&self.table, record)?;
        let key = match outcome {
            SaveOutcome::Inserted => table_key(&self.table, "insert"),
            SaveOutcome::Updated => table_key(&self.table, "update"),
        };
        tracing::info!(table = %self.table, %id, ?outcome, "saved record");
        Ok(Flow::Continue(store.with(key, id.to_string())))
    }
}

/// Deletes the record named by the store's `id`.
#[derive(Debug)]
pub struct DatabaseDelete {
    table: String,
}

impl DatabaseDelete {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl Step for DatabaseDelete {
    fn name(&self) -> &str {
        "database_delete"
    }

    fn kind(&self) -> StepKind {
        StepKind::Loader
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let id = record_id(&store, &self.table)?
            .ok_or_else(|| PipeError::MissingField("id".to_string()))?;
        if !ctx.db.delete_record(&self.table, id)? {
            return Err(PipeError::NotFound(format!(
                "no {} with id '{}'",
                self.table, id
            )));
        }
        tracing::info!(table = %self.table, %id, "deleted record");
        Ok(Flow::Continue(
            store.with(table_key(&self.table, "delete"), true),
        ))
    }
}

/// Builds a raw response from the text at `data_field`.
#[derive(Debug)]
pub struct Respond {
    data_field: Option<String>,
    status: StatusCode,
    headers: HeaderMap,
}

impl Respond {
    pub fn new(data_field: impl Into<String>) -> Self {
        Self {
            data_field: Some(data_field.into()),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// A response with no body.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            data_field: None,
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }
}

impl Step for Respond {
    fn name(&self) -> &str {
        "respond"
    }

    fn kind(&self) -> StepKind {
        StepKind::Loader
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let body = match &self.data_field {
            None => String::new(),
            Some(field) => match store.get(field) {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => return Err(PipeError::MissingField(field.clone())),
            },
        };

        let mut response = PipeResponse::new(self.status, body);
        response.headers.extend(self.headers.clone());
        Ok(Flow::Respond(response))
    }
}

/// Builds a JSON response from the value staged by [`JsonReady`].
#[derive(Debug)]
pub struct RespondJson {
    data_field: String,
    status: StatusCode,
}

impl RespondJson {
    pub fn new() -> Self {
        Self {
            data_field: JsonReady::KEY.to_string(),
            status: StatusCode::OK,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl Default for RespondJson {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for RespondJson {
    fn name(&self) -> &str {
        "respond_json"
    }

    fn kind(&self) -> StepKind {
        StepKind::Loader
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let value = store
            .get(&self.data_field)
            .ok_or_else(|| PipeError::MissingField(self.data_field.clone()))?;
        Ok(Flow::Respond(PipeResponse::json(self.status, value)))
    }
}
