//! Types every registry starts with.
//!
//! | Type | Kind | Behaviour |
//! |------|------|-----------|
//! | `dependencies` | package | yields its `dependencies` field |
//! | `intersection` | package | yields its `dependencies` field (moved there from `intersection`) |
//! | `package` | package | yields its `dependencies` field; package readers replace it |
//! | `require` | leaf | reads through the require extension matching its path |
//! | `js` | script | plain file |
//! | `css` | stylesheet | plain file |

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;

use super::{ContentKind, TypeBundle, TypeDescriptor, TypeRegistry};
use crate::constants::{
    DEPENDENCIES_TYPE, INTERSECTION_TYPE, PACKAGE_TYPE, REQUIRE_TYPE, SCRIPT_TYPE,
    STYLESHEET_TYPE,
};
use crate::core::AssetDepsError;
use crate::dependency::Dependency;
use crate::require::RequireRegistry;
use crate::utils::fs::read_text_file;

/// Registers the built-in types and their extensions.
pub(crate) fn register_builtin_types(types: &TypeRegistry, require: &Arc<RequireRegistry>) {
    let builtins = [
        (DEPENDENCIES_TYPE, nested_list_bundle()),
        (INTERSECTION_TYPE, nested_list_bundle()),
        (PACKAGE_TYPE, nested_list_bundle()),
        (REQUIRE_TYPE, require_bundle(Arc::clone(require))),
        (SCRIPT_TYPE, file_bundle().kind(ContentKind::Script)),
        (STYLESHEET_TYPE, file_bundle().kind(ContentKind::Stylesheet)),
    ];
    for (name, bundle) in builtins {
        types.insert(name, TypeDescriptor::from_bundle(name, bundle));
    }

    types.register_extension(SCRIPT_TYPE, SCRIPT_TYPE);
    types.register_extension(STYLESHEET_TYPE, STYLESHEET_TYPE);
}

/// Package type whose members are the `dependencies` field of their descriptor.
fn nested_list_bundle() -> TypeBundle {
    TypeBundle::new().package().get_dependencies(|dep: &Dependency| {
        let nested = dep.spec().dependencies.clone().unwrap_or_default();
        async move { Ok(nested) }
    })
}

/// Plain file read from disk.
fn file_bundle() -> TypeBundle {
    TypeBundle::new().read(|dep: &Dependency| {
        let path = dep.full_path();
        async move { read_text_file(&path).await }
    })
}

/// Leaf type delegating to the require extension of its path.
///
/// Each dependency keeps the handler it first resolved, so repeated
/// last-modified queries share one computation.
fn require_bundle(require: Arc<RequireRegistry>) -> TypeBundle {
    let for_modified = Arc::clone(&require);
    TypeBundle::new()
        .create_read_stream(move |dep: &Dependency| {
            let handler = dep.require_handler(&require).ok_or_else(|| {
                AssetDepsError::MissingRequireHandler {
                    path: dep.path().to_string(),
                }
            })?;
            handler.create_read_stream()
        })
        .get_last_modified(move |dep: &Dependency| {
            let handler = dep.require_handler(&for_modified);
            let path = dep.path().to_string();
            async move {
                let handler =
                    handler.ok_or(AssetDepsError::MissingRequireHandler { path })?;
                Ok(handler.last_modified().await?)
            }
        })
}

/// Builds a file type whose content is piped through `transform`.
///
/// The returned bundle still has to be registered, typically with
/// [`Registry::register_javascript_type`](crate::registry::Registry::register_javascript_type)
/// or [`Registry::register_stylesheet_type`](crate::registry::Registry::register_stylesheet_type).
///
/// # Examples
///
/// ```rust,no_run
/// use asset_deps::registry::Registry;
/// use asset_deps::types::create_resource_transform_type;
///
/// let registry = Registry::new();
/// let upper = create_resource_transform_type(|code: String| async move {
///     Ok(code.to_uppercase())
/// });
/// registry.register_javascript_type("shout", upper)?;
/// registry.register_extension("shout", "shout");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn create_resource_transform_type<F, Fut>(transform: F) -> TypeBundle
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    let transform = Arc::new(transform);
    TypeBundle::new().read(move |dep: &Dependency| {
        let path = dep.full_path();
        let transform = Arc::clone(&transform);
        async move {
            let code = read_text_file(&path).await?;
            transform(code).await
        }
    })
}
