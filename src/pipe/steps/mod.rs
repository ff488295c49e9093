//! The stock steps pipes are assembled from.
//!
//! Database steps address a table by its public name and publish their
//! results under `<table>_<suffix>` keys: `_list`, `_item`, `_insert`,
//! `_update` and `_delete`.

mod extract;
mod load;
mod transform;

pub use extract::{DatabaseRead, FormData, JsonBody, PathParams, QueryParams};
pub use load::{DatabaseDelete, DatabaseWrite, Respond, RespondJson};
pub use transform::{JsonReady, Lambda, PutDefaults, TemplateReady, ValidForm};

use uuid::Uuid;

use super::{PipeError, Store};

pub fn table_key(table: &str, suffix: &str) -> String {
    format!("{}_{}", table, suffix)
}

/// The record id a database step should act on, if the store names one.
fn record_id(store: &Store, table: &str) -> Result<Option<Uuid>, PipeError> {
    match store.get("id") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(raw)) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| PipeError::NotFound(format!("no {} with id '{}'", table, raw))),
        Some(other) => Err(PipeError::BadRequest(format!(
            "id must be a string, got {}",
            other
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::http::{Method, Uri};
    use todo_core::Database;

    use crate::pipe::{Flow, PipeRequest, PipeResponse, Step, StepContext, Store};

    pub fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    pub fn get() -> PipeRequest {
        PipeRequest::new(Method::GET, Uri::from_static("/"))
    }

    pub fn run(step: &dyn Step, db: &Database, request: &PipeRequest, store: Store) -> Flow {
        run_result(step, db, request, store).unwrap()
    }

    pub fn run_result(
        step: &dyn Step,
        db: &Database,
        request: &PipeRequest,
        store: Store,
    ) -> Result<Flow, crate::pipe::PipeError> {
        let ctx = StepContext { request, db };
        step.run(&ctx, store)
    }

    pub fn store_of(flow: Flow) -> Store {
        match flow {
            Flow::Continue(store) => store,
            Flow::Respond(response) => panic!("expected data, got response {:?}", response),
        }
    }

    pub fn response_of(flow: Flow) -> PipeResponse {
        match flow {
            Flow::Respond(response) => response,
            Flow::Continue(store) => panic!("expected response, got store {:?}", store),
        }
    }
}
