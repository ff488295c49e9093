use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, Uri},
};
use todo_core::Database;

use crate::error::AppResult;
use crate::pipe::{Pipe, PipeRequest, PipeResponse, PipeSchema, StepContext, Store};

/// A pipe schema bound to the database it runs against.
#[derive(Clone)]
pub struct PipeState {
    name: &'static str,
    db: Database,
    schema: Arc<PipeSchema>,
}

impl PipeState {
    pub fn new(name: &'static str, db: Database, schema: PipeSchema) -> Self {
        tracing::debug!(pipe = name, methods = ?schema.methods().collect::<Vec<_>>(), "registered pipe");
        Self {
            name,
            db,
            schema: Arc::new(schema),
        }
    }

    fn run(&self, request: PipeRequest) -> AppResult<PipeResponse> {
        tracing::debug!(pipe = self.name, method = %request.method, uri = %request.uri, "dispatching to pipe");
        let ctx = StepContext {
            request: &request,
            db: &self.db,
        };
        Ok(Pipe::new(ctx, Store::new()).run(&self.schema)?)
    }
}

pub async fn collection(
    State(state): State<PipeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<PipeResponse> {
    let mut request = PipeRequest::new(method, uri).with_body(body);
    request.headers = headers;
    state.run(request)
}

pub async fn member(
    State(state): State<PipeState>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<PipeResponse> {
    let mut request = PipeRequest::new(method, uri)
        .with_param("id", id)
        .with_body(body);
    request.headers = headers;
    state.run(request)
}
