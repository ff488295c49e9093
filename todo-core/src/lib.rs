//! Core library for todo-pipe.
//!
//! This crate provides the todo item model, form validation and database
//! operations, independent of the HTTP layer and of the pipe abstraction
//! built on top of it.
//!
//! # Usage
//!
//! ```no_run
//! use todo_core::db::Database;
//! use todo_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let item = db.create_todo(CreateTodoInput { text: "buy milk".into(), done: false })?;
//! let items = db.list_todos()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod models;

// Re-export commonly used types at crate root
pub use db::{Database, Record, RecordError, SaveOutcome};
