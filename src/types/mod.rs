pub mod error;
pub mod page;
pub mod partial;
pub mod record;
pub mod row;
pub mod value;

// Common type aliases
pub type PageNumber = u32;
pub type RowId = i64;

// SQLite file format constants
pub const HEADER_SIZE: usize = 100; // Database header size, only present on page 1
pub const LEAF_PAGE_HEADER_SIZE: usize = 8;
pub const INTERIOR_PAGE_HEADER_SIZE: usize = 12; // leaf header + right-most pointer (4 bytes)
pub const CELL_POINTER_SIZE: usize = 2;

pub const MIN_PAGE_SIZE: u32 = 512;
pub const MAX_PAGE_SIZE: u32 = 65536;
