use serde_json::{Map, Value};

use super::{record_id, table_key};
use crate::pipe::{Flow, PipeError, Step, StepContext, StepKind, Store};

fn decode_pairs(raw: &[u8]) -> Result<Map<String, Value>, serde_urlencoded::de::Error> {
    // Repeated keys keep the last value, as a form field does.
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)?;
    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

/// Decodes an urlencoded form body into `form`.
#[derive(Debug, Default)]
pub struct FormData;

impl Step for FormData {
    fn name(&self) -> &str {
        "form_data"
    }

    fn kind(&self) -> StepKind {
        StepKind::Extractor
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        if let Some(content_type) = ctx.request.content_type() {
            if !content_type.starts_with("application/x-www-form-urlencoded") {
                tracing::warn!(content_type, "decoding form data from unexpected content type");
            }
        }
        let form = decode_pairs(&ctx.request.body)
            .map_err(|e| PipeError::BadRequest(format!("malformed form data: {}", e)))?;
        Ok(Flow::Continue(store.with("form", Value::Object(form))))
    }
}

/// Decodes a JSON object body into `json`.
#[derive(Debug, Default)]
pub struct JsonBody;

impl Step for JsonBody {
    fn name(&self) -> &str {
        "json_body"
    }

    fn kind(&self) -> StepKind {
        StepKind::Extractor
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let value: Value = serde_json::from_slice(&ctx.request.body)
            .map_err(|e| PipeError::BadRequest(format!("malformed JSON body: {}", e)))?;
        if !value.is_object() {
            return Err(PipeError::BadRequest(
                "JSON body must be an object".to_string(),
            ));
        }
        Ok(Flow::Continue(store.with("json", value)))
    }
}

/// Copies route parameters into the store under their own names.
#[derive(Debug, Default)]
pub struct PathParams;

impl Step for PathParams {
    fn name(&self) -> &str {
        "path_params"
    }

    fn kind(&self) -> StepKind {
        StepKind::Extractor
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let store = ctx
            .request
            .params
            .iter()
            .fold(store, |store, (name, value)| store.with(name.as_str(), value.as_str()));
        Ok(Flow::Continue(store))
    }
}

/// Decodes the query string into `query`.
#[derive(Debug, Default)]
pub struct QueryParams;

impl Step for QueryParams {
    fn name(&self) -> &str {
        "query_params"
    }

    fn kind(&self) -> StepKind {
        StepKind::Extractor
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let raw = ctx.request.uri.query().unwrap_or_default();
        let query = decode_pairs(raw.as_bytes())
            .map_err(|e| PipeError::BadRequest(format!("malformed query string: {}", e)))?;
        Ok(Flow::Continue(store.with("query", Value::Object(query))))
    }
}

/// Reads one record into `<table>_item` when the store has an `id`,
/// otherwise every record into `<table>_list`.
#[derive(Debug)]
pub struct DatabaseRead {
    table: String,
}

impl DatabaseRead {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl Step for DatabaseRead {
    fn name(&self) -> &str {
        "database_read"
    }

    fn kind(&self) -> StepKind {
        StepKind::Extractor
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        match record_id(&store, &self.table)? {
            Some(id) => {
                let record = ctx.db.select_record(&self.table, id)?.ok_or_else(|| {
                    PipeError::NotFound(format!("no {} with id '{}'", self.table, id))
                })?;
                Ok(Flow::Continue(
                    store.with(table_key(&self.table, "item"), Value::Object(record)),
                ))
            }
            None => {
                let records = ctx.db.select_records(&self.table)?;
                let list = records.into_iter().map(Value::Object).collect::<Vec<_>>();
                Ok(Flow::Continue(
                    store.with(table_key(&self.table, "list"), Value::Array(list)),
                ))
            }
        }
    }
}
