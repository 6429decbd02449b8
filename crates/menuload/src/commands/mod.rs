//! CLI command implementations

pub mod columns;
pub mod load;
pub mod sanitize;
