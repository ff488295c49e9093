use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::todo::{CreateTodoInput, TodoItem, MAX_TEXT_LEN};

/// The todo form as submitted by a browser.
///
/// An unticked checkbox is simply absent from the submission, so `done`
/// stays a raw optional string until validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: Option<String>,
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl TodoForm {
    /// Form pre-filled from an existing item, for the edit page.
    pub fn from_item(item: &TodoItem) -> Self {
        Self {
            text: item.text.clone(),
            done: item.done.then(|| "on".to_string()),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.done.as_deref().and_then(parse_flag).unwrap_or(false)
    }

    pub fn validate(&self) -> Result<CreateTodoInput, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        } else if text.chars().count() > MAX_TEXT_LEN {
            errors.add(
                "text",
                format!("Ensure this value has at most {} characters.", MAX_TEXT_LEN),
            );
        }

        let done = match self.done.as_deref() {
            None => false,
            Some(raw) => match parse_flag(raw) {
                Some(flag) => flag,
                None => {
                    errors.add("done", format!("'{}' is not a valid boolean.", raw));
                    false
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CreateTodoInput {
            text: text.to_string(),
            done,
        })
    }
}

/// Interprets the textual spellings of a boolean used by HTML forms.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "" | "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
