pub mod definition;
pub mod error;
pub mod parser;
pub mod query;
