//! Type and extension registry.
//!
//! [`TypeRegistry`] owns two maps: type name → [`TypeDescriptor`] and
//! extension (or literal file name) → type name. Both are filled during a
//! configuration phase and read afterwards; re-registering a name replaces the
//! previous entry.
//!
//! # Extension inference
//!
//! [`TypeRegistry::type_for_path`] looks only at the final path segment:
//!
//! 1. the whole segment, so `browser.json` can map to its own type;
//! 2. every dot-delimited suffix from longest to shortest, so
//!    `jquery-1.8.3.js` tries `8.3.js`, then `3.js`, then `js`;
//! 3. otherwise the last suffix verbatim, even if no type is registered under
//!    it. A segment without a dot has no type.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{TypeBundle, TypeDescriptor};
use crate::core::AssetDepsError;
use crate::dependency::{Dependency, DependencyContext, DependencySpec};

/// Registered types and the extension map used to infer them.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: DashMap<String, Arc<TypeDescriptor>>,
    extensions: DashMap<String, String>,
}

impl TypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a type.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::ConfigurationError`] if the bundle is package-kind and
    /// readable, or declares both `read` and `create_read_stream`.
    pub fn register_type(&self, name: &str, bundle: TypeBundle) -> Result<(), AssetDepsError> {
        if bundle.package && bundle.is_readable() {
            return Err(AssetDepsError::ConfigurationError {
                name: name.to_string(),
                reason: "package types cannot declare read or create_read_stream".to_string(),
            });
        }
        if bundle.read.is_some() && bundle.create_read_stream.is_some() {
            return Err(AssetDepsError::ConfigurationError {
                name: name.to_string(),
                reason: "declare either read or create_read_stream, not both".to_string(),
            });
        }

        self.insert(name, TypeDescriptor::from_bundle(name, bundle));
        Ok(())
    }

    /// Stores an already validated descriptor.
    pub(crate) fn insert(&self, name: &str, descriptor: TypeDescriptor) {
        debug!(
            "Registered type '{}' (kind: {}, package: {}, readable: {})",
            name,
            descriptor.kind(),
            descriptor.is_package(),
            descriptor.is_readable()
        );
        if self.types.insert(name.to_string(), Arc::new(descriptor)).is_some() {
            debug!("Type '{}' replaced an earlier registration", name);
        }
    }

    /// Maps an extension (without leading dot) or a full file name to a type.
    pub fn register_extension(&self, extension: &str, type_name: &str) {
        let extension = extension.trim_start_matches('.');
        trace!("Mapping extension '{}' to type '{}'", extension, type_name);
        self.extensions.insert(extension.to_string(), type_name.to_string());
    }

    /// Looks up a registered type.
    pub fn get_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Every registered type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Every extension mapping as `(extension, type name)`, sorted.
    pub fn extensions(&self) -> Vec<(String, String)> {
        let mut mappings: Vec<(String, String)> = self
            .extensions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        mappings.sort();
        mappings
    }

    /// Infers a type from the final segment of `path`.
    ///
    /// The fallback may name a type that is not registered; instantiating such
    /// a dependency then fails with [`AssetDepsError::UnsupportedType`].
    pub fn type_for_path(&self, path: &str) -> Option<String> {
        let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);

        if let Some(type_name) = self.extensions.get(segment) {
            return Some(type_name.value().clone());
        }

        let mut last_suffix = None;
        for (index, _) in segment.match_indices('.') {
            let suffix = &segment[index + 1..];
            if let Some(type_name) = self.extensions.get(suffix) {
                trace!("'{}' matched extension '{}'", path, suffix);
                return Some(type_name.value().clone());
            }
            last_suffix = Some(suffix);
        }

        last_suffix.map(str::to_string)
    }

    /// Builds a dependency of the type named in `spec`.
    ///
    /// # Errors
    ///
    /// [`AssetDepsError::UnsupportedType`] when the type is missing or not
    /// registered; errors from the type's `init` capability.
    pub fn create_dependency(
        &self,
        spec: DependencySpec,
        context: &DependencyContext,
    ) -> anyhow::Result<Dependency> {
        let Some(type_name) = spec.type_name.clone() else {
            return Err(self.unsupported("<none>").into());
        };
        let Some(descriptor) = self.get_type(&type_name) else {
            return Err(self.unsupported(&type_name).into());
        };

        let mut dependency = Dependency::new(type_name, spec, context.clone(), Arc::clone(&descriptor));
        if let Some(init) = descriptor.init_fn() {
            init(&mut dependency)?;
        }
        trace!("Created {:?}", dependency);
        Ok(dependency)
    }

    fn unsupported(&self, type_name: &str) -> AssetDepsError {
        AssetDepsError::UnsupportedType {
            type_name: type_name.to_string(),
            registered: self.type_names(),
        }
    }
}
