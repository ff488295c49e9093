//! The pipes served by the application.

use axum::http::{header, Method, StatusCode};
use serde_json::{json, Value};
use todo_core::models::parse_flag;

use crate::pipe::steps::{
    table_key, DatabaseDelete, DatabaseRead, DatabaseWrite, FormData, JsonBody, JsonReady,
    Lambda, PathParams, PutDefaults, QueryParams, Respond, RespondJson, TemplateReady, ValidForm,
};
use crate::pipe::{Phases, PipeError, PipeSchema, Store};

pub const TODO_TABLE: &str = "todo-items";

fn key(suffix: &str) -> String {
    table_key(TODO_TABLE, suffix)
}

/// Appends the steps that render the index page from the current items.
fn render_index(phases: Phases) -> Phases {
    let list = key("list");
    phases
        .outbound(DatabaseRead::new(TODO_TABLE))
        .outbound(Lambda::new("items_to_context", move |store: &Store| {
            let items = store.get(&list).cloned().unwrap_or_else(|| json!([]));
            Ok(Store::new().with("context", json!({ "items": items })))
        }))
        .outbound(TemplateReady::new("index"))
        .outbound(Respond::new("template").header(header::CONTENT_TYPE, "text/html; charset=utf-8"))
}

/// Appends the steps that answer with the item named by the store's `id`.
fn respond_with_item(phases: Phases, status: StatusCode) -> Phases {
    phases
        .outbound(DatabaseRead::new(TODO_TABLE))
        .outbound(JsonReady::new(key("item")))
        .outbound(RespondJson::new().status(status))
}

/// HTML page listing the items with a form that posts back to itself.
pub fn form_page() -> PipeSchema {
    PipeSchema::new()
        .method(Method::GET, render_index(Phases::new()))
        .method(
            Method::POST,
            render_index(
                Phases::new()
                    .inbound(FormData)
                    .inbound(PutDefaults::new("form").with_default("done", "off"))
                    .inbound(ValidForm::new(TODO_TABLE, "form", "index"))
                    .inbound(DatabaseWrite::new(TODO_TABLE, "form")),
            ),
        )
}

/// JSON listing (optionally filtered with `?done=`) and creation.
pub fn todo_collection() -> PipeSchema {
    let list = key("list");
    let insert = key("insert");

    let list_phases = Phases::new()
        .outbound(QueryParams)
        .outbound(DatabaseRead::new(TODO_TABLE))
        .outbound(Lambda::new("filter_done", move |store: &Store| {
            let raw = match store.get("query").and_then(|q| q.get("done")) {
                None => return Ok(store.clone()),
                Some(Value::String(blank)) if blank.trim().is_empty() => return Ok(store.clone()),
                Some(raw) => raw,
            };
            let wanted = raw
                .as_str()
                .and_then(parse_flag)
                .ok_or_else(|| PipeError::BadRequest(format!("invalid done filter {}", raw)))?;
            let items: Vec<Value> = store
                .get(&list)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter(|item| item["done"] == wanted)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            Ok(store.with(list.as_str(), items))
        }))
        .outbound(JsonReady::new(key("list")))
        .outbound(RespondJson::new());

    let create_phases = Phases::new()
        .inbound(JsonBody)
        .inbound(Lambda::new("ignore_client_id", |store: &Store| {
            let mut json = store.get("json").cloned().unwrap_or_else(|| json!({}));
            if let Some(object) = json.as_object_mut() {
                object.remove("id");
            }
            Ok(store.with("json", json))
        }))
        .inbound(DatabaseWrite::new(TODO_TABLE, "json"))
        .outbound(Lambda::new("select_inserted", move |store: &Store| {
            let id = store
                .get(&insert)
                .cloned()
                .ok_or_else(|| PipeError::MissingField(insert.clone()))?;
            Ok(store.with("id", id))
        }));

    PipeSchema::new()
        .method(Method::GET, list_phases)
        .method(Method::POST, respond_with_item(create_phases, StatusCode::CREATED))
}

/// JSON read, update and delete of one item addressed by the path.
pub fn todo_member() -> PipeSchema {
    let update = || {
        let phases = Phases::new()
            .inbound(PathParams)
            .inbound(JsonBody)
            .inbound(Lambda::new("target_path_id", |store: &Store| {
                let id = store
                    .get("id")
                    .cloned()
                    .ok_or_else(|| PipeError::MissingField("id".to_string()))?;
                let mut json = store.get("json").cloned().unwrap_or_else(|| json!({}));
                if let Some(object) = json.as_object_mut() {
                    object.insert("id".to_string(), id);
                }
                Ok(store.with("json", json))
            }))
            .inbound(DatabaseWrite::new(TODO_TABLE, "json"));
        respond_with_item(phases, StatusCode::OK)
    };

    PipeSchema::new()
        .method(
            Method::GET,
            respond_with_item(Phases::new().inbound(PathParams), StatusCode::OK),
        )
        .method(Method::PUT, update())
        .method(Method::PATCH, update())
        .method(
            Method::DELETE,
            Phases::new()
                .inbound(PathParams)
                .inbound(DatabaseDelete::new(TODO_TABLE))
                .outbound(Respond::empty(StatusCode::NO_CONTENT)),
        )
}
