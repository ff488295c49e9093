use std::fmt;

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Map, Value};
use todo_core::models::TodoForm;

use crate::pipe::{Flow, PipeError, PipeResponse, Step, StepContext, StepKind, Store};
use crate::templates;

type LambdaFn = dyn Fn(&Store) -> Result<Store, PipeError> + Send + Sync;

/// Replaces the store with whatever the closure returns.
pub struct Lambda {
    name: String,
    f: Box<LambdaFn>,
}

impl Lambda {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Store) -> Result<Store, PipeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda").field("name", &self.name).finish()
    }
}

impl Step for Lambda {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Transformer
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        (self.f)(&store).map(Flow::Continue)
    }
}

/// Fills keys missing from the object at `field`.
#[derive(Debug)]
pub struct PutDefaults {
    field: String,
    defaults: Map<String, Value>,
}

impl PutDefaults {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            defaults: Map::new(),
        }
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }
}

impl Step for PutDefaults {
    fn name(&self) -> &str {
        "put_defaults"
    }

    fn kind(&self) -> StepKind {
        StepKind::Transformer
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let mut object = match store.get(&self.field) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(object)) => object.clone(),
            Some(_) => {
                return Err(PipeError::Invalid(format!(
                    "'{}' is not an object",
                    self.field
                )))
            }
        };
        for (key, value) in &self.defaults {
            object.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(Flow::Continue(
            store.with(self.field.as_str(), Value::Object(object)),
        ))
    }
}

/// Validates the todo form at `field`.
///
/// A valid form is replaced by its cleaned values. An invalid one ends the
/// pipe with `422`: `template` rendered with the rows of `table`, the
/// submitted form and its errors.
#[derive(Debug)]
pub struct ValidForm {
    table: String,
    field: String,
    template: String,
}

impl ValidForm {
    pub fn new(
        table: impl Into<String>,
        field: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
            template: template.into(),
        }
    }
}

impl Step for ValidForm {
    fn name(&self) -> &str {
        "valid_form"
    }

    fn kind(&self) -> StepKind {
        StepKind::Transformer
    }

    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let raw = store
            .get(&self.field)
            .cloned()
            .ok_or_else(|| PipeError::MissingField(self.field.clone()))?;
        let form: TodoForm = serde_json::from_value(raw)
            .map_err(|err| PipeError::Invalid(format!("'{}' is not a form: {}", self.field, err)))?;

        match form.validate() {
            Ok(input) => {
                let cleaned = serde_json::to_value(&input)
                    .map_err(|err| PipeError::Invalid(err.to_string()))?;
                Ok(Flow::Continue(store.with(self.field.as_str(), cleaned)))
            }
            Err(errors) => {
                tracing::debug!(field = %self.field, "form rejected");
                let items = ctx.db.select_records(&self.table)?;
                let context = json!({ "items": items, "form": form, "errors": errors });
                let html = templates::render(&self.template, &context)?;
                Ok(Flow::Respond(
                    PipeResponse::new(StatusCode::UNPROCESSABLE_ENTITY, html).with_header(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    ),
                ))
            }
        }
    }
}

/// Renders a named page from `context` into `template`.
#[derive(Debug)]
pub struct TemplateReady {
    template: String,
}

impl TemplateReady {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Step for TemplateReady {
    fn name(&self) -> &str {
        "template_ready"
    }

    fn kind(&self) -> StepKind {
        StepKind::Transformer
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let context = store.get("context").cloned().unwrap_or(Value::Null);
        let html = templates::render(&self.template, &context)?;
        Ok(Flow::Continue(store.with("template", html)))
    }
}

/// Stages the value at `data_field` as the JSON response body.
#[derive(Debug)]
pub struct JsonReady {
    data_field: String,
}

impl JsonReady {
    pub const KEY: &'static str = "response_json";

    pub fn new(data_field: impl Into<String>) -> Self {
        Self {
            data_field: data_field.into(),
        }
    }
}

impl Step for JsonReady {
    fn name(&self) -> &str {
        "json_ready"
    }

    fn kind(&self) -> StepKind {
        StepKind::Transformer
    }

    fn run(&self, _ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
        let value = store
            .get(&self.data_field)
            .cloned()
            .ok_or_else(|| PipeError::MissingField(self.data_field.clone()))?;
        Ok(Flow::Continue(store.with(Self::KEY, value)))
    }
}
