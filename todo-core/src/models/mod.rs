mod form;
mod todo;

pub use form::*;
pub use todo::*;
