pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod storage;

pub use error::{Error, Result};
