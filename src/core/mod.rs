//! Core types for asset-deps
//!
//! This module holds the pieces every other module builds on:
//!
//! - [`error`] - [`AssetDepsError`], [`SharedError`] and user-facing [`ErrorContext`]
//! - [`async_value`] - [`AsyncValue`], the single-flight memoized result used by
//!   require handlers for last-modified lookups
//!
//! # Examples
//!
//! ```rust
//! use asset_deps::core::{AssetDepsError, AsyncValue, SharedError};
//!
//! let value: AsyncValue<i64, SharedError> = AsyncValue::new();
//! value.reject(SharedError::new(anyhow::Error::from(AssetDepsError::MissingRequireHandler {
//!     path: "theme.less".to_string(),
//! })));
//! assert!(value.outcome().unwrap().is_err());
//! ```

pub mod async_value;
pub mod error;

pub use async_value::AsyncValue;
pub use error::{AssetDepsError, ErrorContext, SharedError, user_friendly_error};
