//! Require-style extension handlers.
//!
//! A require extension tells the dependency system how to read files with a
//! given extension and how to tell when they last changed, mirroring the
//! module loader's per-extension hooks. Handlers come in three flavours that
//! all end up behind the same [`RequireHandler`] surface:
//!
//! - `read`: produce the whole content (text or, in object mode, a JSON value)
//! - `create_read_stream`: produce a stream of chunks
//! - `object`: results are structured values rather than source text
//!
//! [`RequireHandler::last_modified`] and [`RequireHandler::on_last_modified`]
//! share one single-flight computation per handler, backed by an
//! [`AsyncValue`]. Two handlers obtained for the same path do not share it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use asset_deps::dependency::DependencyContext;
//! use asset_deps::require::{RequireExtensionOptions, RequireRegistry};
//! use asset_deps::types::Content;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let require = RequireRegistry::new();
//! require.register_require_extension(
//!     "yaml",
//!     RequireExtensionOptions::new()
//!         .read(|path, _ctx| {
//!             let path = path.to_path_buf();
//!             async move { Ok(Content::Text(tokio::fs::read_to_string(path).await?)) }
//!         }),
//! )?;
//!
//! let ctx = DependencyContext::new("/site");
//! if let Some(handler) = require.get_require_handler(Path::new("/site/data.yaml"), &ctx) {
//!     println!("modified at {}", handler.last_modified().await?);
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::constants::{DEFAULT_INNATE_REQUIRE_EXTENSIONS, UNKNOWN_LAST_MODIFIED};
use crate::core::{AssetDepsError, AsyncValue, SharedError};
use crate::dependency::DependencyContext;
use crate::types::{Content, ContentStream};
use crate::utils::fs::get_file_last_modified;

/// Whole-content read of a required path.
pub type RequireReadFn =
    Arc<dyn Fn(&Path, &DependencyContext) -> BoxFuture<'static, Result<Content>> + Send + Sync>;

/// Stream factory for a required path.
pub type RequireStreamFn =
    Arc<dyn Fn(&Path, &DependencyContext) -> Result<ContentStream> + Send + Sync>;

/// Last-modified lookup for a required path.
pub type RequireLastModifiedFn =
    Arc<dyn Fn(&Path, &DependencyContext) -> BoxFuture<'static, Result<i64>> + Send + Sync>;

/// Options accepted by `register_require_extension` and `register_require_type`.
///
/// Exactly one of [`read`](Self::read) and
/// [`create_read_stream`](Self::create_read_stream) must be set.
#[derive(Clone, Default)]
pub struct RequireExtensionOptions {
    read: Option<RequireReadFn>,
    create_read_stream: Option<RequireStreamFn>,
    get_last_modified: Option<RequireLastModifiedFn>,
    object: bool,
}

impl fmt::Debug for RequireExtensionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequireExtensionOptions")
            .field("read", &self.read.is_some())
            .field("create_read_stream", &self.create_read_stream.is_some())
            .field("get_last_modified", &self.get_last_modified.is_some())
            .field("object", &self.object)
            .finish()
    }
}

impl RequireExtensionOptions {
    /// Empty options; set a read capability before registering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the whole content.
    pub fn read<F, Fut>(mut self, read: F) -> Self
    where
        F: Fn(&Path, &DependencyContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Content>> + Send + 'static,
    {
        self.read = Some(Arc::new(
            move |path: &Path, ctx: &DependencyContext| -> BoxFuture<'static, Result<Content>> {
                Box::pin(read(path, ctx))
            },
        ));
        self
    }

    /// Produces content as a stream.
    pub fn create_read_stream<F>(mut self, create: F) -> Self
    where
        F: Fn(&Path, &DependencyContext) -> Result<ContentStream> + Send + Sync + 'static,
    {
        self.create_read_stream = Some(Arc::new(create));
        self
    }

    /// Computes the last-modified time.
    pub fn get_last_modified<F, Fut>(mut self, get: F) -> Self
    where
        F: Fn(&Path, &DependencyContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<i64>> + Send + 'static,
    {
        self.get_last_modified = Some(Arc::new(
            move |path: &Path, ctx: &DependencyContext| -> BoxFuture<'static, Result<i64>> {
                Box::pin(get(path, ctx))
            },
        ));
        self
    }

    /// Marks results as structured objects.
    #[must_use]
    pub fn object(mut self, object: bool) -> Self {
        self.object = object;
        self
    }
}

/// What to use when `get_last_modified` is not given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LastModifiedFallback {
    /// Modification time of the file on disk.
    FileTime,
    /// Always [`UNKNOWN_LAST_MODIFIED`].
    Unknown,
}

/// A registered extension: the normalized form of [`RequireExtensionOptions`].
#[derive(Clone)]
pub struct RequireExtensionHandler {
    create_read_stream: RequireStreamFn,
    compute_last_modified: RequireLastModifiedFn,
    is_object: bool,
}

impl fmt::Debug for RequireExtensionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequireExtensionHandler")
            .field("is_object", &self.is_object)
            .finish_non_exhaustive()
    }
}

impl RequireExtensionHandler {
    pub(crate) fn from_options(
        name: &str,
        options: RequireExtensionOptions,
        fallback: LastModifiedFallback,
    ) -> Result<Self, AssetDepsError> {
        let create_read_stream = match (options.read, options.create_read_stream) {
            (Some(read), None) => stream_from_read(read),
            (None, Some(create)) => create,
            (Some(_), Some(_)) => {
                return Err(AssetDepsError::ConfigurationError {
                    name: name.to_string(),
                    reason: "declare either read or create_read_stream, not both".to_string(),
                });
            }
            (None, None) => {
                return Err(AssetDepsError::ConfigurationError {
                    name: name.to_string(),
                    reason: "a read or create_read_stream function is required".to_string(),
                });
            }
        };

        let compute_last_modified: RequireLastModifiedFn = match (options.get_last_modified, fallback) {
            (Some(get), _) => get,
            (None, LastModifiedFallback::FileTime) => Arc::new(
                |path: &Path, _ctx: &DependencyContext| -> BoxFuture<'static, Result<i64>> {
                    let path = path.to_path_buf();
                    Box::pin(async move { get_file_last_modified(&path).await })
                },
            ),
            (None, LastModifiedFallback::Unknown) => Arc::new(
                |_path: &Path, _ctx: &DependencyContext| -> BoxFuture<'static, Result<i64>> {
                    Box::pin(async { Ok(UNKNOWN_LAST_MODIFIED) })
                },
            ),
        };

        Ok(Self {
            create_read_stream,
            compute_last_modified,
            is_object: options.object,
        })
    }

    /// Whether results are structured objects.
    pub fn is_object(&self) -> bool {
        self.is_object
    }

    /// Opens a content stream for `path`.
    pub fn create_read_stream(&self, path: &Path, ctx: &DependencyContext) -> Result<ContentStream> {
        (self.create_read_stream)(path, ctx)
    }

    /// Computes the last-modified time of `path`, without memoization.
    pub fn compute_last_modified(
        &self,
        path: &Path,
        ctx: &DependencyContext,
    ) -> BoxFuture<'static, Result<i64>> {
        (self.compute_last_modified)(path, ctx)
    }
}

fn stream_from_read(read: RequireReadFn) -> RequireStreamFn {
    Arc::new(move |path: &Path, ctx: &DependencyContext| {
        let pending = read(path, ctx);
        Ok(stream::once(pending).boxed())
    })
}

/// Resolution of one path through its require extension.
///
/// `create_read_stream` may be called any number of times. The last-modified
/// time is computed at most once per handler, on first demand, and every
/// caller (future or callback style) sees the same outcome.
pub struct RequireHandler {
    path: PathBuf,
    context: DependencyContext,
    extension: Arc<RequireExtensionHandler>,
    last_modified: AsyncValue<i64, SharedError>,
    started: AtomicBool,
}

impl fmt::Debug for RequireHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequireHandler")
            .field("path", &self.path)
            .field("is_object", &self.extension.is_object())
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

impl RequireHandler {
    pub(crate) fn new(
        path: PathBuf,
        context: DependencyContext,
        extension: Arc<RequireExtensionHandler>,
    ) -> Self {
        Self {
            path,
            context,
            extension,
            last_modified: AsyncValue::new(),
            started: AtomicBool::new(false),
        }
    }

    /// The resolved path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether results are structured objects.
    pub fn is_object(&self) -> bool {
        self.extension.is_object()
    }

    /// Opens a fresh content stream.
    pub fn create_read_stream(&self) -> Result<ContentStream> {
        self.extension.create_read_stream(&self.path, &self.context)
    }

    /// Last-modified time, computed once per handler.
    ///
    /// Must be called within a Tokio runtime.
    pub async fn last_modified(&self) -> Result<i64, SharedError> {
        let receiver = self.last_modified.subscribe();
        self.start();
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(SharedError::new(anyhow::anyhow!(
                "Last-modified computation for {} stopped before finishing",
                self.path.display()
            ))),
        }
    }

    /// Callback form of [`last_modified`](Self::last_modified).
    ///
    /// The callback runs exactly once, immediately if the value is already
    /// known. Outside a Tokio runtime the computation cannot start, so the
    /// value is rejected and the callback receives the error.
    pub fn on_last_modified<F>(&self, callback: F)
    where
        F: FnOnce(Result<i64, SharedError>) + Send + 'static,
    {
        self.last_modified.done(callback);
        self.start();
    }

    fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No Tokio runtime to compute the last-modified time of {}", self.path.display());
            self.last_modified.reject(SharedError::new(anyhow::anyhow!(
                "Cannot compute the last-modified time of {} outside a Tokio runtime",
                self.path.display()
            )));
            return;
        };

        trace!("Computing last-modified time of {}", self.path.display());
        let pending = self.extension.compute_last_modified(&self.path, &self.context);
        let value = self.last_modified.clone();
        runtime.spawn(async move {
            match pending.await {
                Ok(modified) => value.resolve(modified),
                Err(error) => value.reject(SharedError::new(error)),
            };
        });
    }
}

/// Registered require extensions.
#[derive(Debug)]
pub struct RequireRegistry {
    handlers: DashMap<String, Arc<RequireExtensionHandler>>,
    innate: RwLock<Vec<String>>,
    names: RwLock<Option<Arc<[String]>>>,
}

impl Default for RequireRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RequireRegistry {
    /// Registry with the default innate extensions and no handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            innate: RwLock::new(
                DEFAULT_INNATE_REQUIRE_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            ),
            names: RwLock::new(None),
        }
    }

    /// Replaces the list of extensions the host loads natively.
    pub fn set_innate_extensions(&self, extensions: Vec<String>) {
        *self.innate.write().unwrap_or_else(PoisonError::into_inner) = extensions;
        self.invalidate_names();
    }

    /// Registers a handler for `extension` (leading dot optional).
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::ConfigurationError`] unless exactly one of `read` and
    /// `create_read_stream` is set.
    pub fn register_require_extension(
        &self,
        extension: &str,
        options: RequireExtensionOptions,
    ) -> Result<(), AssetDepsError> {
        let handler =
            RequireExtensionHandler::from_options(extension, options, LastModifiedFallback::FileTime)?;
        self.insert(extension, Arc::new(handler));
        Ok(())
    }

    pub(crate) fn insert(&self, extension: &str, handler: Arc<RequireExtensionHandler>) {
        let extension = extension.trim_start_matches('.');
        debug!("Registered require extension '.{}' (object: {})", extension, handler.is_object());
        self.handlers.insert(extension.to_string(), handler);
        self.invalidate_names();
    }

    /// Looks up the handler registered for `extension`.
    pub fn get_extension(&self, extension: &str) -> Option<Arc<RequireExtensionHandler>> {
        self.handlers
            .get(extension.trim_start_matches('.'))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Innate and registered extensions in `.ext` form, sorted.
    ///
    /// Computed on first use and cached until the next registration.
    pub fn get_require_extension_names(&self) -> Arc<[String]> {
        if let Some(names) = &*self.names.read().unwrap_or_else(PoisonError::into_inner) {
            return Arc::clone(names);
        }

        let mut all: BTreeSet<String> = self
            .innate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|ext| with_leading_dot(ext))
            .collect();
        all.extend(self.handlers.iter().map(|entry| with_leading_dot(entry.key())));

        let names: Arc<[String]> = all.into_iter().collect();
        *self.names.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&names));
        names
    }

    /// Drops the cached extension names.
    pub fn invalidate_names(&self) {
        *self.names.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Handler for `path`, chosen by the extension of its final segment.
    ///
    /// `None` when the segment has no dot or the extension is not registered.
    /// Every call returns a handler with its own last-modified memoization.
    pub fn get_require_handler(&self, path: &Path, ctx: &DependencyContext) -> Option<RequireHandler> {
        let segment = path.file_name()?.to_str()?;
        let (_, extension) = segment.rsplit_once('.')?;
        let handler = self.get_extension(extension)?;
        trace!("Require handler for {} uses '.{}'", path.display(), extension);
        Some(RequireHandler::new(path.to_path_buf(), ctx.clone(), handler))
    }
}

fn with_leading_dot(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}
