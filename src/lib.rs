//! A todo list served two ways: conventional CRUD pages, and the same data
//! through pipes of extract/transform/load steps.

pub mod api;
pub mod config;
pub mod error;
pub mod pipe;
pub mod pipes;
pub mod templates;

pub use todo_core::{db, models, Database};
