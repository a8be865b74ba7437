pub mod errors;
pub mod grid;
pub mod pipeline;
pub mod query;
pub mod schema;

pub use errors::*;
