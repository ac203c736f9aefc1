//! The composition root.
//!
//! [`Registry`] wires the type registry, the require registry and the
//! normalizer chain together and exposes the registration verbs and the two
//! construction entry points:
//!
//! - [`Registry::normalize_dependencies`] runs raw descriptors through the
//!   normalizer pipeline
//! - [`Registry::create_dependency`] instantiates one typed spec directly
//!
//! Registration is meant to happen up front. Registering while a
//! normalization is in flight is not supported.
//!
//! # Examples
//!
//! ```rust,no_run
//! use asset_deps::registry::Registry;
//! use asset_deps::types::TypeBundle;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Registry::new();
//! registry.register_javascript_type(
//!     "widget",
//!     TypeBundle::new().read(|dep| {
//!         let name = dep.path().to_string();
//!         async move { Ok(format!("/* {name} */")) }
//!     }),
//! )?;
//!
//! let deps = registry
//!     .normalize_dependencies(vec!["widget:a".into(), "lib/b.js".into()], "/site", None)
//!     .await?;
//! assert_eq!(deps[0].type_name(), "widget");
//! assert_eq!(deps[1].type_name(), "js");
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

use crate::config::Config;
use crate::constants::REQUIRE_TYPE;
use crate::core::AssetDepsError;
use crate::dependency::{Dependency, DependencyContext, DependencySpec, Descriptor};
use crate::normalizer::{self, Normalizer};
use crate::require::{
    LastModifiedFallback, RequireExtensionHandler, RequireExtensionOptions, RequireHandler,
    RequireRegistry,
};
use crate::types::builtin::register_builtin_types;
use crate::types::{ContentKind, TypeBundle, TypeDescriptor, TypeRegistry};

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Types, require extensions and normalizers.
#[derive(Debug)]
pub struct Registry {
    types: Arc<TypeRegistry>,
    require: Arc<RequireRegistry>,
    // In the order added; the pipeline runs them newest first
    normalizers: RwLock<Vec<Normalizer>>,
    glob_enabled: AtomicBool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry with the built-in types and extensions.
    pub fn new() -> Self {
        let types = Arc::new(TypeRegistry::new());
        let require = Arc::new(RequireRegistry::new());
        register_builtin_types(&types, &require);

        Self {
            types,
            require,
            normalizers: RwLock::new(Vec::new()),
            glob_enabled: AtomicBool::new(true),
        }
    }

    /// Registry with the built-ins plus the settings of `config`.
    pub fn with_config(config: &Config) -> Self {
        let registry = Self::new();
        for (extension, type_name) in &config.extensions {
            registry.register_extension(extension, type_name);
        }
        registry.require.set_innate_extensions(config.require.innate_extensions.clone());
        registry.set_glob_enabled(config.glob.enabled);
        registry
    }

    /// Turns the glob normalizer on or off.
    pub fn set_glob_enabled(&self, enabled: bool) {
        self.glob_enabled.store(enabled, Ordering::SeqCst);
    }

    /// The underlying type registry.
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// The underlying require registry.
    pub fn require(&self) -> &Arc<RequireRegistry> {
        &self.require
    }

    // ---- registration ----

    /// Registers (or replaces) a type.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::ConfigurationError`] for inconsistent bundles.
    pub fn register_type(&self, name: &str, bundle: TypeBundle) -> Result<(), AssetDepsError> {
        self.types.register_type(name, bundle)?;
        self.require.invalidate_names();
        Ok(())
    }

    /// Registers a type whose content is script.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_javascript_type(
        &self,
        name: &str,
        bundle: TypeBundle,
    ) -> Result<(), AssetDepsError> {
        self.register_type(name, bundle.kind(ContentKind::Script))
    }

    /// Registers a type whose content is a stylesheet.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_stylesheet_type(
        &self,
        name: &str,
        bundle: TypeBundle,
    ) -> Result<(), AssetDepsError> {
        self.register_type(name, bundle.kind(ContentKind::Stylesheet))
    }

    /// Registers a package type.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::ConfigurationError`] if the bundle can be read.
    pub fn register_package_type(
        &self,
        name: &str,
        bundle: TypeBundle,
    ) -> Result<(), AssetDepsError> {
        self.register_type(name, bundle.package())
    }

    /// Maps an extension or a full file name to a type.
    pub fn register_extension(&self, extension: &str, type_name: &str) {
        self.types.register_extension(extension, type_name);
        self.require.invalidate_names();
    }

    /// Registers a require extension.
    ///
    /// Without `get_last_modified`, the file's modification time is used.
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
        self.require.register_require_extension(extension, options)
    }

    /// Registers `name` both as a require extension and as a package type
    /// whose only dependency is a `require` leaf reading through it.
    ///
    /// Without `get_last_modified`, both report
    /// [`UNKNOWN_LAST_MODIFIED`](crate::constants::UNKNOWN_LAST_MODIFIED).
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::ConfigurationError`] unless exactly one of `read` and
    /// `create_read_stream` is set.
    pub fn register_require_type(
        &self,
        name: &str,
        options: RequireExtensionOptions,
    ) -> Result<(), AssetDepsError> {
        let handler = Arc::new(RequireExtensionHandler::from_options(
            name,
            options,
            LastModifiedFallback::Unknown,
        )?);

        let for_type = Arc::clone(&handler);
        let bundle = TypeBundle::new().package().get_dependencies(move |dep: &Dependency| {
            let leaf = require_leaf(&for_type, dep);
            async move { Ok(vec![Descriptor::from(leaf)]) }
        });
        self.types.register_type(name, bundle)?;
        self.require.insert(name, handler);
        debug!("Registered require type '{}'", name);
        Ok(())
    }

    /// Adds a normalizer. Later normalizers run before earlier ones; all of
    /// them run after the glob normalizer and before the default one.
    pub fn add_normalizer(&self, normalizer: Normalizer) {
        debug!("Adding normalizer '{}'", normalizer.name());
        self.normalizers.write().unwrap_or_else(PoisonError::into_inner).push(normalizer);
        self.require.invalidate_names();
    }

    // ---- construction ----

    /// Normalizes `descriptors` into typed dependencies.
    ///
    /// # Errors
    ///
    /// The first normalizer or instantiation failure; no partial result is
    /// returned.
    pub async fn normalize_dependencies(
        &self,
        descriptors: Vec<Descriptor>,
        directory: impl Into<PathBuf>,
        file: Option<&Path>,
    ) -> Result<Vec<Arc<Dependency>>> {
        let mut ctx = DependencyContext::new(directory);
        if let Some(file) = file {
            ctx = ctx.with_file(file);
        }
        let chain = self.normalizer_chain();
        normalizer::run_pipeline(&chain, &self.types, descriptors, &ctx).await
    }

    /// Instantiates a typed spec directly, without normalization.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::UnsupportedType`] when `spec.type` is missing or not
    /// registered.
    pub fn create_dependency(
        &self,
        spec: DependencySpec,
        directory: impl Into<PathBuf>,
        file: Option<&Path>,
    ) -> Result<Dependency> {
        let mut ctx = DependencyContext::new(directory);
        if let Some(file) = file {
            ctx = ctx.with_file(file);
        }
        self.types.create_dependency(spec, &ctx)
    }

    /// Glob, user normalizers newest first, then default.
    fn normalizer_chain(&self) -> Vec<Normalizer> {
        let user = self.normalizers.read().unwrap_or_else(PoisonError::into_inner);
        let mut chain = Vec::with_capacity(user.len() + 2);
        if self.glob_enabled.load(Ordering::SeqCst) {
            chain.push(normalizer::glob_normalizer());
        }
        chain.extend(user.iter().rev().cloned());
        chain.push(normalizer::default_normalizer(Arc::clone(&self.types)));
        chain
    }

    // ---- queries ----

    /// Handler for `path`, if its extension has a require extension.
    pub fn get_require_handler(
        &self,
        path: impl AsRef<Path>,
        ctx: &DependencyContext,
    ) -> Option<RequireHandler> {
        self.require.get_require_handler(path.as_ref(), ctx)
    }

    /// Innate and registered require extensions, `.ext` form, sorted.
    pub fn get_require_extension_names(&self) -> Arc<[String]> {
        self.require.get_require_extension_names()
    }

    /// Type inferred from the final segment of `path`.
    pub fn type_for_path(&self, path: &str) -> Option<String> {
        self.types.type_for_path(path)
    }

    /// A registered type.
    pub fn get_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get_type(name)
    }

    /// Every registered type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        self.types.type_names()
    }

    /// See [`crate::types::create_resource_transform_type`].
    pub fn create_resource_transform_type<F, Fut>(transform: F) -> TypeBundle
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        crate::types::create_resource_transform_type(transform)
    }
}

/// The `require` leaf a require type expands to.
///
/// Each leaf owns one [`RequireHandler`], so its last-modified time is
/// computed once no matter how often it is asked for.
fn require_leaf(extension: &Arc<RequireExtensionHandler>, package: &Dependency) -> Dependency {
    let handler = Arc::new(RequireHandler::new(
        package.full_path(),
        package.context().clone(),
        Arc::clone(extension),
    ));
    let for_modified = Arc::clone(&handler);
    let bundle = TypeBundle::new()
        .create_read_stream(move |_leaf: &Dependency| handler.create_read_stream())
        .get_last_modified(move |_leaf: &Dependency| {
            let handler = Arc::clone(&for_modified);
            async move { Ok(handler.last_modified().await?) }
        });

    let mut spec = DependencySpec::typed(REQUIRE_TYPE, package.path());
    if extension.is_object() {
        spec = spec.with_property("object", serde_json::Value::Bool(true));
    }
    Dependency::new(
        REQUIRE_TYPE.to_string(),
        spec,
        package.context().clone(),
        Arc::new(TypeDescriptor::from_bundle(REQUIRE_TYPE, bundle)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobConfig;
    use crate::constants::UNKNOWN_LAST_MODIFIED;
    use crate::normalizer::Normalized;
    use crate::types::Content;

    fn suffixing(name: &'static str) -> Normalizer {
        Normalizer::new(name, move |descriptor, _ctx| {
            Ok(match descriptor {
                Descriptor::Path(path) => Normalized::Replaced(Descriptor::Path(format!("{path}-{name}"))),
                _ => Normalized::Unchanged,
            })
        })
    }

    #[tokio::test]
    async fn test_user_normalizers_run_newest_first() {
        let registry = Registry::new();
        registry.add_normalizer(suffixing("a"));
        registry.add_normalizer(suffixing("b"));

        let deps = registry
            .normalize_dependencies(vec!["js:x".into()], "/site", None)
            .await
            .unwrap();
        assert_eq!(deps[0].type_name(), "js");
        assert_eq!(deps[0].path(), "x-b-a");
    }

    #[tokio::test]
    async fn test_file_is_recorded_on_every_dependency() {
        let registry = Registry::new();
        let deps = registry
            .normalize_dependencies(
                vec!["a.js".into(), "b.css".into()],
                "/site",
                Some(Path::new("/site/index.html")),
            )
            .await
            .unwrap();

        for dep in &deps {
            assert_eq!(dep.directory(), Path::new("/site"));
            assert_eq!(dep.file(), Some(Path::new("/site/index.html")));
        }
    }

    #[test]
    fn test_create_dependency_bypasses_normalization() {
        let registry = Registry::new();
        let dep = registry
            .create_dependency(DependencySpec::typed("css", "js:a.js"), "/site", None)
            .unwrap();
        assert_eq!(dep.type_name(), "css");
        assert_eq!(dep.path(), "js:a.js");

        assert!(registry.create_dependency(DependencySpec::default(), "/site", None).is_err());
    }

    #[tokio::test]
    async fn test_require_type_expands_to_require_leaf() {
        let registry = Registry::new();
        registry
            .register_require_type(
                "yaml",
                RequireExtensionOptions::new()
                    .read(|_path, _ctx| async { Ok(Content::Text("key: value".to_string())) }),
            )
            .unwrap();

        let deps = registry
            .normalize_dependencies(vec!["conf/app.yaml".into()], "/site", None)
            .await
            .unwrap();
        let package = &deps[0];
        assert_eq!(package.type_name(), "yaml");
        assert!(package.is_package());
        assert_eq!(package.last_modified().await.unwrap(), UNKNOWN_LAST_MODIFIED);

        let nested = package.dependencies().await.unwrap();
        let leaf = nested[0].as_instance().unwrap();
        assert_eq!(leaf.type_name(), REQUIRE_TYPE);
        assert_eq!(leaf.path(), "conf/app.yaml");
        assert_eq!(leaf.read_to_string().await.unwrap(), "key: value");
        assert_eq!(leaf.last_modified().await.unwrap(), UNKNOWN_LAST_MODIFIED);

        assert!(registry.get_require_extension_names().contains(&".yaml".to_string()));
        let ctx = DependencyContext::new("/site");
        assert!(registry.get_require_handler("/site/other.yaml", &ctx).is_some());
    }

    #[test]
    fn test_invalid_require_type_registers_nothing() {
        let registry = Registry::new();
        assert!(registry.register_require_type("yaml", RequireExtensionOptions::new()).is_err());
        assert!(registry.get_type("yaml").is_none());
        assert!(!registry.get_require_extension_names().contains(&".yaml".to_string()));
    }

    #[test]
    fn test_every_verb_invalidates_extension_names() {
        let registry = Registry::new();
        let before = registry.get_require_extension_names();

        registry.register_extension("jsx", "js");
        let after = registry.get_require_extension_names();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before, after);

        registry.add_normalizer(suffixing("z"));
        assert!(!Arc::ptr_eq(&after, &registry.get_require_extension_names()));
    }

    #[tokio::test]
    async fn test_with_config() {
        let mut config = Config::default();
        config.extensions.insert("jsx".to_string(), "js".to_string());
        config.require.innate_extensions = vec![".mjs".to_string()];
        config.glob = GlobConfig {
            enabled: false,
        };
        let registry = Registry::with_config(&config);

        assert_eq!(registry.type_for_path("App.jsx").as_deref(), Some("js"));
        assert_eq!(&*registry.get_require_extension_names(), &[".mjs".to_string()]);

        // With globbing off the pattern reaches the default normalizer as is
        let deps = registry
            .normalize_dependencies(vec!["js:*.js".into()], "/nowhere", None)
            .await
            .unwrap();
        assert_eq!(deps[0].path(), "*.js");
    }

    #[test]
    fn test_global_registry_has_builtins() {
        assert!(global().get_type("js").is_some());
        assert!(global().get_type(REQUIRE_TYPE).is_some());
    }
}
