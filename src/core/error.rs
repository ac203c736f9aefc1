//! Error handling for asset-deps
//!
//! This module provides the typed error enum used across the crate and the
//! user-facing error reporting used by the command-line front end.
//!
//! # Architecture
//!
//! - [`AssetDepsError`] - Enumerated error types for every failure the core can report
//! - [`SharedError`] - Cloneable wrapper so one failure can be delivered to many subscribers
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Error Categories
//!
//! - **Registration**: [`AssetDepsError::ConfigurationError`] is raised synchronously by the
//!   registration verbs and is never retried.
//! - **Instantiation**: [`AssetDepsError::UnsupportedType`] aborts the normalization run that
//!   produced the offending descriptor.
//! - **Normalization**: [`AssetDepsError::NormalizerFailed`] wraps whatever a normalizer returned.
//! - **Reading**: [`AssetDepsError::NotReadable`] and [`AssetDepsError::MissingRequireHandler`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use asset_deps::core::{AssetDepsError, user_friendly_error};
//!
//! let error = AssetDepsError::UnsupportedType {
//!     type_name: "widgt".to_string(),
//!     registered: vec!["css".to_string(), "js".to_string(), "widget".to_string()],
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with a "did you mean" suggestion
//! ```

use colored::Colorize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for asset-deps operations
#[derive(Error, Debug)]
pub enum AssetDepsError {
    /// A registration call was rejected.
    ///
    /// Raised for bundles that are package-kind and readable at the same time,
    /// bundles declaring two read capabilities, and require-extension options
    /// without exactly one of `read` / `create_read_stream`.
    #[error("Invalid registration for '{name}': {reason}")]
    ConfigurationError {
        /// Type or extension being registered
        name: String,
        /// Why the registration was rejected
        reason: String,
    },

    /// A descriptor named a type that is not registered (or no type at all).
    #[error(
        "Unsupported dependency type '{type_name}'. Registered types: {}",
        .registered.join(", ")
    )]
    UnsupportedType {
        /// The requested type, or `<none>` when no type could be inferred
        type_name: String,
        /// Every registered type name, sorted
        registered: Vec<String>,
    },

    /// A normalizer returned an error; the whole run was aborted.
    #[error("Normalizer '{normalizer}' failed on {descriptor}")]
    NormalizerFailed {
        /// Name of the failing normalizer
        normalizer: String,
        /// Short rendering of the descriptor being normalized
        descriptor: String,
        /// The error returned by the normalizer
        #[source]
        source: anyhow::Error,
    },

    /// No require extension handles the given path.
    #[error("No require extension registered for '{path}'")]
    MissingRequireHandler {
        /// The path whose extension had no handler
        path: String,
    },

    /// Content was requested from a dependency whose type cannot be read.
    #[error("Dependency '{path}' of type '{type_name}' has no readable content")]
    NotReadable {
        /// Type of the dependency
        type_name: String,
        /// Path of the dependency
        path: String,
    },

    /// The configuration file could not be parsed.
    #[error("Invalid configuration file {file}")]
    ConfigParse {
        /// Path to the configuration file
        file: String,
        /// Parser message
        reason: String,
    },
}

/// A cloneable handle to an [`anyhow::Error`].
///
/// Memoized asynchronous results are delivered to every subscriber, so the
/// error half has to be `Clone`. The wrapper displays as the inner error and
/// exposes the inner error's source chain.
#[derive(Clone)]
pub struct SharedError(Arc<anyhow::Error>);

impl SharedError {
    /// Wrap an error for sharing.
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for SharedError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// The CLI converts every failure into an `ErrorContext` before printing so
/// users see the error, optional details (yellow) and an optional suggestion
/// (green).
#[derive(Debug)]
pub struct ErrorContext {
    /// The error message shown first
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// The error chain is walked so an [`AssetDepsError`] wrapped in
/// `anyhow` context (or behind a [`SharedError`]) is still recognized.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for (depth, cause) in error.chain().enumerate() {
        if let Some(deps_error) = cause.downcast_ref::<AssetDepsError>() {
            let ctx = create_error_context(deps_error);
            // Outer context messages are kept as details
            return if depth == 0 { ctx } else { ctx.with_details(format!("{error:#}")) };
        }
        if let Some(shared) = cause.downcast_ref::<SharedError>() {
            if let Some(deps_error) = shared.inner().downcast_ref::<AssetDepsError>() {
                return create_error_context(deps_error);
            }
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(format!("Invalid configuration: {toml_error}"))
            .with_suggestion("Check the TOML syntax of your asset-deps.toml file");
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &AssetDepsError) -> ErrorContext {
    match error {
        AssetDepsError::UnsupportedType {
            type_name,
            registered,
        } => {
            let ctx = ErrorContext::new(error.to_string());
            match closest_type(type_name, registered) {
                Some(candidate) => ctx.with_suggestion(format!("Did you mean '{candidate}'?")),
                None => ctx.with_suggestion(
                    "Prefix the path with a registered type (e.g. 'js:app.js') or register the type first",
                ),
            }
        }
        AssetDepsError::ConfigurationError { reason, .. } => {
            ErrorContext::new(error.to_string()).with_details(reason.clone())
        }
        AssetDepsError::MissingRequireHandler { .. } => ErrorContext::new(error.to_string())
            .with_suggestion("Register a require extension or require type for this extension"),
        AssetDepsError::NormalizerFailed { source, .. } => {
            ErrorContext::new(error.to_string()).with_details(format!("{source:#}"))
        }
        AssetDepsError::ConfigParse { reason, .. } => {
            ErrorContext::new(error.to_string()).with_details(reason.clone())
        }
        AssetDepsError::NotReadable { .. } => ErrorContext::new(error.to_string()),
    }
}

fn closest_type<'a>(requested: &str, registered: &'a [String]) -> Option<&'a str> {
    registered
        .iter()
        .map(|name| (name, strsim::jaro_winkler(requested, name)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.as_str())
}
