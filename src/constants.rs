//! Global constants used throughout the asset-deps codebase.
//!
//! Sentinels, well-known type names and defaults that several modules agree
//! on live here so the string literals are defined exactly once.

/// Last-modified value reported when a timestamp cannot be determined.
///
/// Downstream caches must treat this value as "always stale" and never
/// reuse content keyed on it.
pub const UNKNOWN_LAST_MODIFIED: i64 = -1;

/// Minimum length of the word in a `<word>:<path>` type prefix.
///
/// Single letters are rejected so Windows drive letters (`C:\styles\a.css`)
/// are never mistaken for a type.
pub const MIN_TYPE_PREFIX_LEN: usize = 2;

/// Extensions the host can load natively, reported by
/// `get_require_extension_names` even without an explicit registration.
pub const DEFAULT_INNATE_REQUIRE_EXTENSIONS: &[&str] = &[".js", ".json"];

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "asset-deps.toml";

/// Built-in type for a plain list of nested dependencies.
pub const DEPENDENCIES_TYPE: &str = "dependencies";

/// Built-in type for a package directory.
pub const PACKAGE_TYPE: &str = "package";

/// Built-in type for an intersection of dependency lists.
pub const INTERSECTION_TYPE: &str = "intersection";

/// Built-in leaf type read through a require extension.
pub const REQUIRE_TYPE: &str = "require";

/// Built-in plain JavaScript file type.
pub const SCRIPT_TYPE: &str = "js";

/// Built-in plain stylesheet file type.
pub const STYLESHEET_TYPE: &str = "css";
