use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest text accepted for a single item.
pub const MAX_TEXT_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Uuid,
    pub text: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    /// Path of the item's detail page.
    pub fn url(&self) -> String {
        format!("/todos/{}", self.id)
    }

    pub fn edit_url(&self) -> String {
        format!("/todos/{}/edit", self.id)
    }

    pub fn delete_url(&self) -> String {
        format!("/todos/{}/delete", self.id)
    }
}

impl std::fmt::Display for TodoItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// Full replacement of the editable fields, as submitted by the edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTodoInput {
    pub text: String,
    pub done: bool,
}

impl From<CreateTodoInput> for UpdateTodoInput {
    fn from(input: CreateTodoInput) -> Self {
        Self {
            text: input.text,
            done: input.done,
        }
    }
}
