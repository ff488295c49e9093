mod pipe_views;
mod todos;

use axum::{
    routing::{any, get, MethodRouter},
    Json, Router,
};
use serde_json::{json, Value};
use todo_core::Database;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::pipe::PipeSchema;
use crate::pipes;
pub use pipe_views::PipeState;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

pub fn create_router(db: Database) -> Router {
    let pages = Router::new()
        .route("/", get(todos::list))
        .route("/todos/new", get(todos::new_form).post(todos::create))
        .route("/todos/{id}", get(todos::detail))
        .route("/todos/{id}/edit", get(todos::edit_form).post(todos::update))
        .route(
            "/todos/{id}/delete",
            get(todos::confirm_delete).post(todos::delete),
        )
        .with_state(AppState { db: db.clone() });

    let pipe_api = Router::new()
        .route(
            "/pipe/api/todos",
            pipe_route("todo_collection", db.clone(), pipes::todo_collection()),
        )
        .route(
            "/pipe/api/todos/{id}",
            any(pipe_views::member)
                .with_state(PipeState::new("todo_member", db.clone(), pipes::todo_member())),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health))
        .route("/pipe/", pipe_route("form_page", db, pipes::form_page()))
        .merge(pages)
        .merge(pipe_api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves `schema` for every method on a route without path parameters.
pub fn pipe_route(name: &'static str, db: Database, schema: PipeSchema) -> MethodRouter {
    any(pipe_views::collection).with_state(PipeState::new(name, db, schema))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
