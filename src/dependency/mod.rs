//! Dependency descriptors and typed dependency instances.
//!
//! Raw input arrives as a [`Descriptor`]: a bare string (`"app.js"`,
//! `"css:theme/main"`), an object ([`DependencySpec`]) or an already finished
//! [`Dependency`]. The normalizer pipeline turns every descriptor into a
//! [`Dependency`], a struct that pairs the resolved configuration with the
//! [`TypeDescriptor`] it was built from.
//!
//! # Formats
//!
//! Descriptors deserialize from either form (serde `untagged`):
//!
//! ```toml
//! dependencies = [
//!     "js:vendor/jquery.js",
//!     { type = "css", path = "theme.css", media = "print" },
//!     { package = "node_modules/widgets" },
//! ]
//! ```

use anyhow::{Context, Result};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

use crate::constants::UNKNOWN_LAST_MODIFIED;
use crate::core::AssetDepsError;
use crate::require::{RequireHandler, RequireRegistry};
use crate::types::{Content, ContentKind, ContentStream, TypeDescriptor};
use crate::utils::fs::get_file_last_modified;

/// A dependency descriptor before (or after) normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    /// Bare path, optionally prefixed with `<type>:`.
    Path(String),

    /// Object form. Boxed to keep the enum small.
    Spec(Box<DependencySpec>),

    /// A finished dependency, passed through untouched.
    #[serde(skip)]
    Instance(Arc<Dependency>),
}

impl Descriptor {
    /// Returns the finished dependency when this descriptor is one.
    pub fn as_instance(&self) -> Option<&Arc<Dependency>> {
        match self {
            Self::Instance(dep) => Some(dep),
            _ => None,
        }
    }

    /// The path carried by the descriptor, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path),
            Self::Spec(spec) => spec.path.as_deref(),
            Self::Instance(dep) => Some(dep.path()),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "'{path}'"),
            Self::Spec(spec) => match serde_json::to_string(spec) {
                Ok(json) => f.write_str(&json),
                Err(_) => write!(f, "{spec:?}"),
            },
            Self::Instance(dep) => write!(f, "{}:{}", dep.type_name(), dep.path()),
        }
    }
}

impl From<&str> for Descriptor {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<DependencySpec> for Descriptor {
    fn from(spec: DependencySpec) -> Self {
        Self::Spec(Box::new(spec))
    }
}

impl From<Dependency> for Descriptor {
    fn from(dep: Dependency) -> Self {
        Self::Instance(Arc::new(dep))
    }
}

impl From<Arc<Dependency>> for Descriptor {
    fn from(dep: Arc<Dependency>) -> Self {
        Self::Instance(dep)
    }
}

/// Object form of a descriptor.
///
/// Only `type` and `path` matter to most types; `package`, `intersection`
/// and `dependencies` drive type inference in the default normalizer. Any
/// other field is kept in [`extra`](Self::extra) for the type's own use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Registered type name.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Path relative to the owning directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Package directory; implies the `package` type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Dependencies to intersect; implies the `intersection` type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection: Option<Vec<Descriptor>>,

    /// Nested dependencies; implies the `dependencies` type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Descriptor>>,

    /// Any other field.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DependencySpec {
    /// Spec with a type and a path.
    pub fn typed(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the type.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets an extra field.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Directory and defining file shared by every descriptor in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyContext {
    /// Directory relative paths are resolved against.
    pub directory: PathBuf,
    /// File that declared the dependencies, when known.
    pub file: Option<PathBuf>,
}

impl DependencyContext {
    /// Context for `directory` with no defining file.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file: None,
        }
    }

    /// Sets the defining file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Resolves `path` against the directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.directory.join(path)
    }
}

/// A typed dependency.
///
/// Created by the type registry from a [`DependencySpec`] and the
/// [`DependencyContext`] of the run. The methods below are the generic
/// wrapper around the type's capabilities: they fall back to defaults when a
/// capability is absent and trace every call.
pub struct Dependency {
    type_name: String,
    path: String,
    context: DependencyContext,
    spec: DependencySpec,
    descriptor: Arc<TypeDescriptor>,
    require_handler: OnceLock<Arc<RequireHandler>>,
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("type_name", &self.type_name)
            .field("path", &self.path)
            .field("directory", &self.context.directory)
            .field("file", &self.context.file)
            .finish_non_exhaustive()
    }
}

impl Dependency {
    pub(crate) fn new(
        type_name: String,
        spec: DependencySpec,
        context: DependencyContext,
        descriptor: Arc<TypeDescriptor>,
    ) -> Self {
        let path = spec.path.clone().or_else(|| spec.package.clone()).unwrap_or_default();
        Self {
            type_name,
            path,
            context,
            spec,
            descriptor,
            require_handler: OnceLock::new(),
        }
    }

    /// Require handler for this dependency's path, looked up once and then
    /// reused so its last-modified computation is shared by every call.
    pub(crate) fn require_handler(&self, require: &RequireRegistry) -> Option<Arc<RequireHandler>> {
        if let Some(handler) = self.require_handler.get() {
            return Some(Arc::clone(handler));
        }
        let handler = require.get_require_handler(&self.full_path(), &self.context)?;
        Some(Arc::clone(self.require_handler.get_or_init(|| Arc::new(handler))))
    }

    /// Registered type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Path as written in the descriptor (prefix removed).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Owning directory.
    pub fn directory(&self) -> &Path {
        &self.context.directory
    }

    /// Defining file.
    pub fn file(&self) -> Option<&Path> {
        self.context.file.as_deref()
    }

    /// Directory and file together.
    pub fn context(&self) -> &DependencyContext {
        &self.context
    }

    /// The full configuration this dependency was built from.
    pub fn spec(&self) -> &DependencySpec {
        &self.spec
    }

    /// Mutable configuration, for `init` capabilities.
    pub fn spec_mut(&mut self) -> &mut DependencySpec {
        &mut self.spec
    }

    /// An extra configuration field.
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.spec.extra.get(key)
    }

    /// The capability table of this dependency's type.
    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Whether this dependency groups other dependencies.
    pub fn is_package(&self) -> bool {
        self.descriptor.is_package()
    }

    /// Kind of content this dependency yields.
    pub fn content_kind(&self) -> ContentKind {
        self.descriptor.kind()
    }

    /// Path resolved against the owning directory.
    pub fn full_path(&self) -> PathBuf {
        self.context.resolve(&self.path)
    }

    /// Opens the content stream.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::NotReadable`] for package types and types without a
    /// read capability, or whatever the type's stream factory returns.
    pub fn read_stream(&self) -> Result<ContentStream> {
        let Some(create) = self.descriptor.stream_factory() else {
            return Err(AssetDepsError::NotReadable {
                type_name: self.type_name.clone(),
                path: self.path.clone(),
            }
            .into());
        };
        trace!("Opening content stream for {}:{}", self.type_name, self.path);
        create(self)
    }

    /// Reads the whole content.
    ///
    /// Text chunks are concatenated; object chunks are rendered as JSON.
    pub async fn read_to_string(&self) -> Result<String> {
        let chunks: Vec<Content> = self
            .read_stream()?
            .try_collect()
            .await
            .with_context(|| format!("Failed to read {}:{}", self.type_name, self.path))?;

        let mut out = String::new();
        for chunk in chunks {
            match chunk {
                Content::Text(text) => out.push_str(&text),
                Content::Object(value) => out.push_str(&value.to_string()),
            }
        }
        Ok(out)
    }

    /// Nested descriptors of a package-kind dependency.
    ///
    /// Falls back to the `dependencies` field of the spec.
    pub async fn dependencies(&self) -> Result<Vec<Descriptor>> {
        match self.descriptor.dependencies_fn() {
            Some(get) => {
                let deps = get(self).await.with_context(|| {
                    format!("Failed to list dependencies of {}:{}", self.type_name, self.path)
                })?;
                debug!("{}:{} has {} dependencies", self.type_name, self.path, deps.len());
                Ok(deps)
            }
            None => Ok(self.spec.dependencies.clone().unwrap_or_default()),
        }
    }

    /// Cache key for this dependency.
    pub fn key(&self) -> String {
        match self.descriptor.key_fn() {
            Some(compute) => compute(self),
            None => format!("{}:{}", self.type_name, self.full_path().display()),
        }
    }

    /// Last-modified time in milliseconds since the Unix epoch.
    ///
    /// Types without a last-modified capability use the file's modification
    /// time; package types without one report
    /// [`UNKNOWN_LAST_MODIFIED`](crate::constants::UNKNOWN_LAST_MODIFIED).
    pub async fn last_modified(&self) -> Result<i64> {
        let modified = match self.descriptor.last_modified_fn() {
            Some(compute) => compute(self).await?,
            None if self.is_package() => UNKNOWN_LAST_MODIFIED,
            None => get_file_last_modified(&self.full_path()).await?,
        };
        trace!("{}:{} last modified at {}", self.type_name, self.path, modified);
        Ok(modified)
    }
}
