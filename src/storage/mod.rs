pub mod btree;
pub mod catalog;
pub mod database;
pub mod header;
pub mod pager;
pub mod schema;
pub mod varint;

pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Root page of the catalog table (`sqlite_schema`).
pub const CATALOG_ROOT_PAGE: crate::types::PageNumber = 1;
