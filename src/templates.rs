//! Server-rendered HTML pages.
//!
//! Pages are plain functions over typed data. The pipe's template step looks
//! them up by name through [`render`] and feeds them a JSON context.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use todo_core::models::{FormErrors, TodoForm, TodoItem};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown template '{0}'")]
    Unknown(String),
    #[error("bad context for template '{template}': {source}")]
    Context {
        template: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ListContext {
    #[serde(default)]
    items: Vec<TodoItem>,
    #[serde(default)]
    form: TodoForm,
    #[serde(default)]
    errors: FormErrors,
}

/// Renders a named page from a JSON context of the form `{"items": [...]}`.
/// The index page also takes the rejected `form` and its `errors`.
pub fn render(name: &str, context: &Value) -> Result<String, TemplateError> {
    let parse = || -> Result<ListContext, TemplateError> {
        if context.is_null() {
            return Ok(ListContext::default());
        }
        ListContext::deserialize(context).map_err(|source| TemplateError::Context {
            template: name.to_string(),
            source,
        })
    };

    match name {
        "index" => {
            let context = parse()?;
            Ok(index_with_form(&context.items, &context.form, &context.errors))
        }
        "todo_list" => Ok(todo_list(&parse()?.items)),
        other => Err(TemplateError::Unknown(other.to_string())),
    }
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

fn item_line(item: &TodoItem) -> String {
    let marker = if item.done { "[x]" } else { "[ ]" };
    format!(
        r#"        <li class="{class}">{marker} <a href="{url}">{text}</a> <a href="{edit}">edit</a> <a href="{delete}">delete</a></li>"#,
        class = if item.done { "done" } else { "open" },
        marker = marker,
        url = item.url(),
        text = escape(&item.text),
        edit = item.edit_url(),
        delete = item.delete_url(),
    )
}

fn item_list(items: &[TodoItem]) -> String {
    if items.is_empty() {
        return "    <p class=\"empty\">Nothing to do.</p>".to_string();
    }
    let lines: Vec<String> = items.iter().map(item_line).collect();
    format!("    <ul>\n{}\n    </ul>", lines.join("\n"))
}

fn error_list(errors: &FormErrors) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("    <ul class=\"errors\">\n");
    for (field, messages) in errors.iter() {
        for message in messages {
            out.push_str(&format!(
                "        <li>{}: {}</li>\n",
                escape(field),
                escape(message)
            ));
        }
    }
    out.push_str("    </ul>\n");
    out
}

/// The pipe-driven page: the list plus an inline form posting back to itself.
pub fn index(items: &[TodoItem]) -> String {
    index_with_form(items, &TodoForm::default(), &FormErrors::default())
}

/// The index page shown again with a rejected submission.
pub fn index_with_form(items: &[TodoItem], form: &TodoForm, errors: &FormErrors) -> String {
    let body = format!(
        r#"{errors}    <form method="post" action="/pipe/">
        <input type="text" name="text" value="{text}" required>
        <label><input type="checkbox" name="done"{checked}> done</label>
        <button type="submit">Add</button>
    </form>
{list}"#,
        errors = error_list(errors),
        text = escape(&form.text),
        checked = if form.is_checked() { " checked" } else { "" },
        list = item_list(items)
    );
    layout("Todo", &body)
}

pub fn todo_list(items: &[TodoItem]) -> String {
    // The listing also embeds the items as JSON for scripts on the page.
    // Script content is not entity-decoded, so only `<` needs neutralising.
    let json = serde_json::to_string(items)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c");
    let body = format!(
        r#"    <p><a href="/todos/new">New item</a></p>
{list}
    <script type="application/json" id="todo-data">{json}</script>"#,
        list = item_list(items),
        json = json
    );
    layout("Todo items", &body)
}

pub fn todo_detail(item: &TodoItem) -> String {
    let body = format!(
        r#"    <p class="text">{text}</p>
    <p class="status">{status}</p>
    <p class="created">Created {created}</p>
    <p><a href="{edit}">Edit</a> <a href="{delete}">Delete</a> <a href="/">Back</a></p>"#,
        text = escape(&item.text),
        status = if item.done { "Done" } else { "Open" },
        created = item.created_at.format("%Y-%m-%d %H:%M"),
        edit = item.edit_url(),
        delete = item.delete_url(),
    );
    layout("Todo item", &body)
}

pub fn todo_form(title: &str, action: &str, form: &TodoForm, errors: &FormErrors) -> String {
    let body = format!(
        r#"{errors}    <form method="post" action="{action}">
        <label>Text <textarea name="text">{text}</textarea></label>
        <label><input type="checkbox" name="done"{checked}> done</label>
        <button type="submit">Save</button>
    </form>
    <p><a href="/">Back</a></p>"#,
        errors = error_list(errors),
        action = escape(action),
        text = escape(&form.text),
        checked = if form.is_checked() { " checked" } else { "" },
    );
    layout(title, &body)
}

pub fn todo_delete(item: &TodoItem) -> String {
    let body = format!(
        r#"    <p>Delete "{text}"?</p>
    <form method="post" action="{action}">
        <button type="submit">Delete</button>
    </form>
    <p><a href="{url}">Cancel</a></p>"#,
        text = escape(&item.text),
        action = item.delete_url(),
        url = item.url(),
    );
    layout("Delete item", &body)
}
