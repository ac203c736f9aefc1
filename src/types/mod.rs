//! Dependency types as capability tables.
//!
//! A dependency type is described by a [`TypeBundle`]: a small set of
//! optional capabilities (`read`, `create_read_stream`, `get_dependencies`,
//! `calculate_key`, `get_last_modified`, `init`), a package flag and a
//! [`ContentKind`]. Registration normalizes the bundle into an immutable
//! [`TypeDescriptor`]:
//!
//! - `read` and `create_read_stream` collapse into a single stream factory, so
//!   every readable type exposes the same pull-stream contract
//! - `calculate_key` and `get_last_modified` move to internal slots that the
//!   generic wrapper on [`Dependency`] calls
//!
//! Capabilities are dispatched by presence; there is no type hierarchy.
//!
//! # Examples
//!
//! ```rust
//! use asset_deps::types::TypeBundle;
//!
//! let widget = TypeBundle::new()
//!     .read(|dep| {
//!         let name = dep.path().to_string();
//!         async move { Ok(format!("/* widget {name} */")) }
//!     })
//!     .calculate_key(|dep| format!("widget:{}", dep.path()));
//! ```

pub mod builtin;
pub mod registry;

pub use builtin::create_resource_transform_type;
pub use registry::TypeRegistry;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::dependency::{Dependency, Descriptor};

/// One piece of dependency content.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Source text.
    Text(String),
    /// Structured data produced by object-mode require extensions.
    Object(serde_json::Value),
}

/// Pull stream of content chunks.
pub type ContentStream = BoxStream<'static, Result<Content>>;

/// Stream factory capability.
pub type StreamFn = Arc<dyn Fn(&Dependency) -> Result<ContentStream> + Send + Sync>;

/// Whole-content read capability.
pub type ReadFn = Arc<dyn Fn(&Dependency) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Nested dependency listing capability.
pub type DependenciesFn =
    Arc<dyn Fn(&Dependency) -> BoxFuture<'static, Result<Vec<Descriptor>>> + Send + Sync>;

/// Cache key capability.
pub type KeyFn = Arc<dyn Fn(&Dependency) -> String + Send + Sync>;

/// Last-modified capability (milliseconds since the Unix epoch).
pub type LastModifiedFn =
    Arc<dyn Fn(&Dependency) -> BoxFuture<'static, Result<i64>> + Send + Sync>;

/// Post-construction hook.
pub type InitFn = Arc<dyn Fn(&mut Dependency) -> Result<()> + Send + Sync>;

/// What a readable type produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// CSS and languages compiling to it.
    Stylesheet,
    /// JavaScript and languages compiling to it.
    Script,
    /// Not tagged.
    #[default]
    None,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stylesheet => f.write_str("stylesheet"),
            Self::Script => f.write_str("script"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Capabilities supplied when registering a type.
#[derive(Clone, Default)]
pub struct TypeBundle {
    pub(crate) read: Option<ReadFn>,
    pub(crate) create_read_stream: Option<StreamFn>,
    pub(crate) get_dependencies: Option<DependenciesFn>,
    pub(crate) calculate_key: Option<KeyFn>,
    pub(crate) get_last_modified: Option<LastModifiedFn>,
    pub(crate) init: Option<InitFn>,
    pub(crate) package: bool,
    pub(crate) kind: ContentKind,
}

impl fmt::Debug for TypeBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBundle")
            .field("read", &self.read.is_some())
            .field("create_read_stream", &self.create_read_stream.is_some())
            .field("get_dependencies", &self.get_dependencies.is_some())
            .field("calculate_key", &self.calculate_key.is_some())
            .field("get_last_modified", &self.get_last_modified.is_some())
            .field("init", &self.init.is_some())
            .field("package", &self.package)
            .field("kind", &self.kind)
            .finish()
    }
}

impl TypeBundle {
    /// Empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the whole content at once.
    pub fn read<F, Fut>(mut self, read: F) -> Self
    where
        F: Fn(&Dependency) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.read = Some(Arc::new(move |dep: &Dependency| -> BoxFuture<'static, Result<String>> {
            Box::pin(read(dep))
        }));
        self
    }

    /// Produces content as a stream.
    pub fn create_read_stream<F>(mut self, create: F) -> Self
    where
        F: Fn(&Dependency) -> Result<ContentStream> + Send + Sync + 'static,
    {
        self.create_read_stream = Some(Arc::new(create));
        self
    }

    /// Lists nested dependencies.
    pub fn get_dependencies<F, Fut>(mut self, get: F) -> Self
    where
        F: Fn(&Dependency) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Descriptor>>> + Send + 'static,
    {
        self.get_dependencies = Some(Arc::new(
            move |dep: &Dependency| -> BoxFuture<'static, Result<Vec<Descriptor>>> {
                Box::pin(get(dep))
            },
        ));
        self
    }

    /// Computes the cache key.
    pub fn calculate_key<F>(mut self, calculate: F) -> Self
    where
        F: Fn(&Dependency) -> String + Send + Sync + 'static,
    {
        self.calculate_key = Some(Arc::new(calculate));
        self
    }

    /// Computes the last-modified time.
    pub fn get_last_modified<F, Fut>(mut self, get: F) -> Self
    where
        F: Fn(&Dependency) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<i64>> + Send + 'static,
    {
        self.get_last_modified = Some(Arc::new(move |dep: &Dependency| -> BoxFuture<'static, Result<i64>> {
            Box::pin(get(dep))
        }));
        self
    }

    /// Runs once on every new instance.
    pub fn init<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut Dependency) -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    /// Marks the type as a package (a group of dependencies).
    #[must_use]
    pub fn package(mut self) -> Self {
        self.package = true;
        self
    }

    /// Tags the content kind.
    #[must_use]
    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether a content-read capability is declared.
    pub fn is_readable(&self) -> bool {
        self.read.is_some() || self.create_read_stream.is_some()
    }
}

/// A registered type: the normalized, immutable form of a [`TypeBundle`].
pub struct TypeDescriptor {
    name: String,
    kind: ContentKind,
    package: bool,
    stream: Option<StreamFn>,
    get_dependencies: Option<DependenciesFn>,
    compute_key: Option<KeyFn>,
    compute_last_modified: Option<LastModifiedFn>,
    init: Option<InitFn>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("package", &self.package)
            .field("readable", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl TypeDescriptor {
    /// Normalizes a bundle. Validation happens in [`TypeRegistry::register_type`].
    pub(crate) fn from_bundle(name: &str, bundle: TypeBundle) -> Self {
        let stream = match (bundle.create_read_stream, bundle.read) {
            (Some(stream), _) => Some(stream),
            (None, Some(read)) => Some(stream_from_read(read)),
            (None, None) => None,
        };

        Self {
            name: name.to_string(),
            kind: bundle.kind,
            package: bundle.package,
            stream,
            get_dependencies: bundle.get_dependencies,
            compute_key: bundle.calculate_key,
            compute_last_modified: bundle.get_last_modified,
            init: bundle.init,
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content kind tag.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Whether this is a package type.
    pub fn is_package(&self) -> bool {
        self.package
    }

    /// Whether instances can be read.
    pub fn is_readable(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) fn stream_factory(&self) -> Option<&StreamFn> {
        self.stream.as_ref()
    }

    pub(crate) fn dependencies_fn(&self) -> Option<&DependenciesFn> {
        self.get_dependencies.as_ref()
    }

    pub(crate) fn key_fn(&self) -> Option<&KeyFn> {
        self.compute_key.as_ref()
    }

    pub(crate) fn last_modified_fn(&self) -> Option<&LastModifiedFn> {
        self.compute_last_modified.as_ref()
    }

    pub(crate) fn init_fn(&self) -> Option<&InitFn> {
        self.init.as_ref()
    }
}

/// Wraps a whole-content read into a one-chunk stream.
fn stream_from_read(read: ReadFn) -> StreamFn {
    Arc::new(move |dep: &Dependency| {
        let pending = read(dep);
        Ok(stream::once(pending.map(|text| text.map(Content::Text))).boxed())
    })
}
