pub mod meta_command;
pub mod result;
pub mod scan;
pub mod select;
pub mod sequential_scan;
