//! asset-deps - dependency types and descriptor normalization for asset bundlers
//!
//! Build pipelines declare their inputs in many shapes: bare paths, paths
//! with a `type:` prefix, objects with extra settings, globs, package
//! directories. This crate turns such heterogeneous descriptors into a
//! uniform list of typed [`Dependency`](dependency::Dependency) values, each
//! backed by a registered type that knows how to read it, list its nested
//! dependencies, key it and date it.
//!
//! # Architecture Overview
//!
//! - **Types** are capability tables registered by name. A type may read
//!   content (whole or streamed), list nested dependencies (package types),
//!   compute a cache key and a last-modified time.
//! - **Extension inference** maps file names to types, longest suffix first,
//!   so `jquery-1.8.3.js` can have a type of its own.
//! - **Normalizers** rewrite descriptors until every one names a type. The
//!   pipeline runs glob expansion first, user normalizers next (newest first)
//!   and the default normalizer last.
//! - **Require extensions** resolve a path by its extension to a handler with
//!   a read stream and a memoized last-modified time.
//!
//! # Core Modules
//!
//! - [`registry`] - The facade: registration verbs and entry points
//! - [`types`] - Type bundles, the type registry and built-in types
//! - [`normalizer`] - The normalizer pipeline, glob and default normalizers
//! - [`require`] - Require extensions and handlers
//! - [`dependency`] - Descriptors and dependency instances
//! - [`core`] - Errors and the single-flight [`AsyncValue`](core::AsyncValue)
//!
//! ## Supporting Modules
//! - [`config`] - `asset-deps.toml`
//! - [`cli`] - The `asset-deps` command line
//! - [`constants`] - Built-in type names and defaults
//! - [`utils`] - File helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use asset_deps::registry::Registry;
//! use asset_deps::dependency::{DependencySpec, Descriptor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Registry::new();
//! registry.register_extension("browser.json", "package");
//!
//! let deps = registry
//!     .normalize_dependencies(
//!         vec![
//!             Descriptor::from("js:vendor/*.js"),
//!             Descriptor::from("theme/main.css"),
//!             DependencySpec::default().with_path("node_modules/ui/browser.json").into(),
//!         ],
//!         "/site",
//!         None,
//!     )
//!     .await?;
//!
//! for dep in &deps {
//!     println!("{} {} (modified {})", dep.type_name(), dep.path(), dep.last_modified().await?);
//! }
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod registry;

// Dependency model
pub mod dependency;
pub mod normalizer;
pub mod require;
pub mod types;

// Supporting modules
pub mod utils;

// Test utilities (only compiled in test mode or with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
