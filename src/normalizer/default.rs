//! The normalizer that always runs last.
//!
//! It gives every untyped descriptor a type:
//!
//! - strings use their `type:` prefix, or the type inferred from the file
//!   extension
//! - objects without a `type` are typed by the first field present among
//!   `package`, `path`, `intersection` and `dependencies`
//!
//! Typed objects and finished dependencies pass through unchanged.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::{Normalized, Normalizer};
use crate::constants::{DEPENDENCIES_TYPE, INTERSECTION_TYPE, MIN_TYPE_PREFIX_LEN, PACKAGE_TYPE};
use crate::dependency::{DependencySpec, Descriptor};
use crate::types::TypeRegistry;

/// Name the default normalizer reports in logs and errors.
pub const DEFAULT_NORMALIZER: &str = "default";

// A single letter before the colon is a drive letter, not a type
static TYPE_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)^(\w{{{MIN_TYPE_PREFIX_LEN},}}):(.*)$")).ok()
});

/// Splits `js:app.js` into `("js", "app.js")`.
///
/// Returns `None` when there is no prefix of at least two word characters,
/// so `C:\site\app.js` keeps its drive letter.
pub fn parse_type_prefix(descriptor: &str) -> Option<(&str, &str)> {
    let captures = TYPE_PREFIX.as_ref()?.captures(descriptor)?;
    let type_name = captures.get(1)?.as_str();
    let path = captures.get(2)?.as_str();
    Some((type_name, path))
}

/// The default normalizer, inferring types from `types`.
pub fn default_normalizer(types: Arc<TypeRegistry>) -> Normalizer {
    Normalizer::new(DEFAULT_NORMALIZER, move |descriptor, _ctx| {
        Ok(normalize_descriptor(&types, descriptor))
    })
}

fn normalize_descriptor(types: &TypeRegistry, descriptor: &Descriptor) -> Normalized {
    match descriptor {
        Descriptor::Instance(_) => Normalized::Unchanged,
        Descriptor::Path(raw) => {
            let (type_name, path) = infer_type(types, raw);
            Normalized::Replaced(
                DependencySpec {
                    type_name,
                    path: Some(path),
                    ..DependencySpec::default()
                }
                .into(),
            )
        }
        Descriptor::Spec(spec) if spec.type_name.is_some() => Normalized::Unchanged,
        Descriptor::Spec(spec) => {
            let mut spec = (**spec).clone();
            if let Some(package) = &spec.package {
                spec.type_name = Some(PACKAGE_TYPE.to_string());
                if spec.path.is_none() {
                    spec.path = Some(package.clone());
                }
            } else if let Some(raw) = spec.path.take() {
                let (type_name, path) = infer_type(types, &raw);
                spec.type_name = type_name;
                spec.path = Some(path);
            } else if let Some(nested) = spec.intersection.take() {
                spec.type_name = Some(INTERSECTION_TYPE.to_string());
                spec.dependencies = Some(nested);
            } else if spec.dependencies.is_some() {
                spec.type_name = Some(DEPENDENCIES_TYPE.to_string());
            } else {
                return Normalized::Unchanged;
            }
            Normalized::Replaced(spec.into())
        }
    }
}

fn infer_type(types: &TypeRegistry, raw: &str) -> (Option<String>, String) {
    match parse_type_prefix(raw) {
        Some((type_name, path)) => (Some(type_name.to_string()), path.to_string()),
        None => (types.type_for_path(raw), raw.to_string()),
    }
}
