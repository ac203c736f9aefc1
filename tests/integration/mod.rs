//! Integration test suite for asset-deps
//!
//! End-to-end tests over the public API and the `asset-deps` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: The `asset-deps` binary
//! - **glob**: Glob expansion against real directories
//! - **normalize**: Pipeline ordering, expansion and failures
//! - **require**: Require extensions, require types and last-modified memoization
//! - **types**: Type registration, inference and reading

mod cli;
mod glob;
mod normalize;
mod require;
mod types;
