//! Request handling composed from ordered steps.
//!
//! A pipe runs the steps configured for the request's HTTP method in two
//! phases: `inbound` (request side) then `outbound` (response side). Data
//! travels between steps in a [`Store`]. Steps fall into three kinds:
//!
//! - extractors read request data or database rows into the store,
//! - transformers derive or reshape store data,
//! - loaders write store data to the database or turn it into a response.
//!
//! The first step that produces a [`PipeResponse`] ends the run.

mod http;
mod schema;
mod store;
pub mod steps;

use axum::http::Method;
use thiserror::Error;
use todo_core::{Database, RecordError};

pub use http::{PipeRequest, PipeResponse};
pub use schema::{Phases, PipeSchema};
pub use store::Store;

use crate::templates::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Extractor,
    Transformer,
    Loader,
}

/// What a step hands on: more data, or the final response.
#[derive(Debug)]
pub enum Flow {
    Continue(Store),
    Respond(PipeResponse),
}

/// Read-only surroundings available to every step.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub request: &'a PipeRequest,
    pub db: &'a Database,
}

pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> StepKind;
    fn run(&self, ctx: &StepContext<'_>, store: Store) -> Result<Flow, PipeError>;
}

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store has no usable '{0}'")]
    MissingField(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("pipe for {method} finished without a response")]
    NoResponse { method: Method },
}

/// One execution of a schema against one request.
pub struct Pipe<'a> {
    ctx: StepContext<'a>,
    store: Store,
}

impl<'a> Pipe<'a> {
    pub fn new(ctx: StepContext<'a>, initial: Store) -> Self {
        Self {
            ctx,
            store: initial,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn run(mut self, schema: &PipeSchema) -> Result<PipeResponse, PipeError> {
        let request = self.ctx.request;
        let method = &request.method;
        let Some(phases) = schema.phases_for(method) else {
            tracing::debug!(%method, "no pipe configured for method");
            return Ok(PipeResponse::text(
                axum::http::StatusCode::BAD_REQUEST,
                "method isn't supported",
            ));
        };

        if let Some(response) = self.run_steps(&phases.inbound)? {
            return Ok(response);
        }
        self.run_steps(&phases.outbound)?
            .ok_or_else(|| PipeError::NoResponse {
                method: method.clone(),
            })
    }

    /// Runs `steps` in order against the current store. Returns the response
    /// of the first step that produced one.
    pub fn run_steps(
        &mut self,
        steps: &[Box<dyn Step>],
    ) -> Result<Option<PipeResponse>, PipeError> {
        for step in steps {
            tracing::debug!(step = step.name(), kind = ?step.kind(), "running step");
            let store = std::mem::take(&mut self.store);
            match step.run(&self.ctx, store)? {
                Flow::Continue(store) => self.store = store,
                Flow::Respond(response) => {
                    tracing::debug!(
                        step = step.name(),
                        status = %response.status,
                        "step produced a response"
                    );
                    return Ok(Some(response));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::{StatusCode, Uri};
    use serde_json::json;

    use super::*;

    struct Put(&'static str, i64);

    impl Step for Put {
        fn name(&self) -> &str {
            "put"
        }
        fn kind(&self) -> StepKind {
            StepKind::Transformer
        }
        fn run(&self, _: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
            Ok(Flow::Continue(store.with(self.0, self.1)))
        }
    }

    /// Responds with the store serialised as JSON.
    struct Echo;

    impl Step for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn kind(&self) -> StepKind {
            StepKind::Loader
        }
        fn run(&self, _: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
            Ok(Flow::Respond(PipeResponse::json(
                StatusCode::OK,
                &store.into_json(),
            )))
        }
    }

    struct Counter(Arc<AtomicUsize>);

    impl Step for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn kind(&self) -> StepKind {
            StepKind::Transformer
        }
        fn run(&self, _: &StepContext<'_>, store: Store) -> Result<Flow, PipeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Flow::Continue(store))
        }
    }

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn run(schema: &PipeSchema, method: Method) -> Result<PipeResponse, PipeError> {
        let db = db();
        let request = PipeRequest::new(method, Uri::from_static("/"));
        let ctx = StepContext {
            request: &request,
            db: &db,
        };
        Pipe::new(ctx, Store::new()).run(schema)
    }

    fn body_json(response: &PipeResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn store_is_shared_across_phases() {
        let schema = PipeSchema::new().method(
            Method::POST,
            Phases::new().inbound(Put("a", 1)).outbound(Put("b", 2)).outbound(Echo),
        );
        let response = run(&schema, Method::POST).unwrap();
        assert_eq!(body_json(&response), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn stops_at_first_response() {
        let hits = Arc::new(AtomicUsize::new(0));
        let schema = PipeSchema::new().method(
            Method::GET,
            Phases::new()
                .outbound(Echo)
                .outbound(Counter(hits.clone())),
        );
        run(&schema, Method::GET).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inbound_response_skips_outbound() {
        let hits = Arc::new(AtomicUsize::new(0));
        let schema = PipeSchema::new().method(
            Method::POST,
            Phases::new()
                .inbound(Echo)
                .outbound(Counter(hits.clone()))
                .outbound(Echo),
        );
        run(&schema, Method::POST).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unconfigured_method_is_not_supported() {
        let schema = PipeSchema::new().method(Method::GET, Phases::new().outbound(Echo));
        let response = run(&schema, Method::PUT).unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body_str(), Some("method isn't supported"));
    }

    #[test]
    fn head_falls_back_to_get() {
        let schema = PipeSchema::new().method(Method::GET, Phases::new().outbound(Echo));
        let response = run(&schema, Method::HEAD).unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn missing_response_is_an_error() {
        let schema = PipeSchema::new().method(Method::GET, Phases::new().outbound(Put("a", 1)));
        let err = run(&schema, Method::GET).unwrap_err();
        assert!(matches!(err, PipeError::NoResponse { method } if method == Method::GET));
    }

    #[test]
    fn run_steps_keeps_store_between_calls() {
        let db = db();
        let request = PipeRequest::new(Method::GET, Uri::from_static("/"));
        let ctx = StepContext {
            request: &request,
            db: &db,
        };
        let mut pipe = Pipe::new(ctx, Store::new().with("seed", true));
        let steps: Vec<Box<dyn Step>> = vec![Box::new(Put("x", 7))];

        assert!(pipe.run_steps(&steps).unwrap().is_none());
        assert_eq!(pipe.store().get("x"), Some(&json!(7)));
        assert_eq!(pipe.store().get("seed"), Some(&json!(true)));
    }
}
