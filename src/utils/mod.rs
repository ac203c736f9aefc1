//! Utilities shared by the built-in types and require handlers
//!
//! - [`fs`] - Asynchronous file reads and modification-time queries

pub mod fs;
