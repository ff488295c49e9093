//! Conventional server-rendered CRUD pages, without pipes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use todo_core::models::{FormErrors, TodoForm, TodoItem};
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::templates;

fn missing(id: impl std::fmt::Display) -> AppError {
    AppError::not_found(format!("todo item {} not found", id))
}

/// A malformed id can't name a stored item, so it is reported as missing.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| missing(raw))
}

fn find(state: &AppState, raw: &str) -> AppResult<TodoItem> {
    let id = parse_id(raw)?;
    state.db.get_todo(id)?.ok_or_else(|| missing(id))
}

fn invalid_form(title: &str, action: &str, form: &TodoForm, errors: &FormErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(templates::todo_form(title, action, form, errors)),
    )
        .into_response()
}

pub async fn list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let items = state.db.list_todos()?;
    Ok(Html(templates::todo_list(&items)))
}

pub async fn new_form() -> Html<String> {
    Html(templates::todo_form(
        "New item",
        "/todos/new",
        &TodoForm::default(),
        &FormErrors::default(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<TodoForm>,
) -> AppResult<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(invalid_form("New item", "/todos/new", &form, &errors)),
    };

    let item = state.db.create_todo(input)?;
    tracing::info!(id = %item.id, "created todo item");
    Ok(Redirect::to(&item.url()).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let item = find(&state, &id)?;
    Ok(Html(templates::todo_detail(&item)))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let item = find(&state, &id)?;
    Ok(Html(templates::todo_form(
        "Edit item",
        &item.edit_url(),
        &TodoForm::from_item(&item),
        &FormErrors::default(),
    )))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> AppResult<Response> {
    let item = find(&state, &id)?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(invalid_form("Edit item", &item.edit_url(), &form, &errors)),
    };

    let updated = state
        .db
        .update_todo(item.id, input.into())?
        .ok_or_else(|| missing(item.id))?;
    tracing::info!(id = %item.id, "updated todo item");
    Ok(Redirect::to(&updated.url()).into_response())
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let item = find(&state, &id)?;
    Ok(Html(templates::todo_delete(&item)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Redirect> {
    let id = parse_id(&id)?;
    if !state.db.delete_todo(id)? {
        return Err(missing(id));
    }
    tracing::info!(%id, "deleted todo item");
    Ok(Redirect::to("/"))
}
