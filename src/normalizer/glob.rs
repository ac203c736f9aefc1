//! The normalizer that always runs first: expands glob paths.
//!
//! A descriptor whose path (after any `type:` prefix) contains `*`, `?` or
//! `[` is replaced by one descriptor per matching file, relative to the
//! context directory. The type prefix and every other field of an object
//! descriptor carry over to each match. A pattern that matches nothing
//! expands to nothing.
//!
//! A path naming an existing file is never treated as a pattern, so files
//! such as `[id].js` survive both as direct descriptors and as expansion
//! results that run through the chain again. Neither is `lib.js?v=2` when
//! `lib.js` exists and the pattern matches nothing.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::{Normalized, Normalizer, parse_type_prefix};
use crate::dependency::{DependencyContext, Descriptor};

/// Name the glob normalizer reports in logs and errors.
pub const GLOB_NORMALIZER: &str = "glob";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Whether `path` contains glob syntax.
pub fn is_glob_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// The glob normalizer.
pub fn glob_normalizer() -> Normalizer {
    Normalizer::new(GLOB_NORMALIZER, expand_descriptor)
}

fn expand_descriptor(descriptor: &Descriptor, ctx: &DependencyContext) -> Result<Normalized> {
    match descriptor {
        Descriptor::Instance(_) => Ok(Normalized::Unchanged),
        Descriptor::Path(raw) => {
            let Some(matches) = expand_path(raw, ctx)? else {
                return Ok(Normalized::Unchanged);
            };
            Ok(Normalized::Expanded(matches.into_iter().map(Descriptor::Path).collect()))
        }
        Descriptor::Spec(spec) => {
            let Some(raw) = spec.path.as_deref() else {
                return Ok(Normalized::Unchanged);
            };
            let Some(matches) = expand_path(raw, ctx)? else {
                return Ok(Normalized::Unchanged);
            };
            Ok(Normalized::Expanded(
                matches
                    .into_iter()
                    .map(|path| {
                        let mut expanded = (**spec).clone();
                        expanded.path = Some(path);
                        expanded.into()
                    })
                    .collect(),
            ))
        }
    }
}

/// Matching paths with the original prefix re-attached, or `None` when `raw`
/// is not a pattern.
fn expand_path(raw: &str, ctx: &DependencyContext) -> Result<Option<Vec<String>>> {
    let (prefix, pattern) = match parse_type_prefix(raw) {
        Some((type_name, pattern)) => (Some(type_name), pattern),
        None => (None, raw),
    };
    if !is_glob_pattern(pattern) || ctx.resolve(pattern).is_file() {
        return Ok(None);
    }

    let matches = find_matches(pattern, &ctx.directory)?;
    if matches.is_empty() && is_query_suffixed(pattern, ctx) {
        trace!("Treating '{}' as a path with a query string", raw);
        return Ok(None);
    }
    if matches.is_empty() {
        warn!("Pattern '{}' matched no files in {}", raw, ctx.directory.display());
    }
    Ok(Some(
        matches
            .into_iter()
            .map(|path| match prefix {
                Some(type_name) => format!("{type_name}:{path}"),
                None => path,
            })
            .collect(),
    ))
}

/// `lib.js?v=2` where `lib.js` is an existing file.
fn is_query_suffixed(pattern: &str, ctx: &DependencyContext) -> bool {
    pattern
        .split_once('?')
        .is_some_and(|(path, _)| !is_glob_pattern(path) && ctx.resolve(path).is_file())
}

/// Files under `base` matching `pattern`, in directory-walk order.
///
/// Relative patterns yield paths relative to `base`; absolute patterns yield
/// absolute paths. Only the directory below the pattern's literal leading
/// components is walked.
pub fn find_matches(pattern: &str, base: &Path) -> Result<Vec<String>> {
    let matcher =
        Pattern::new(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
    let absolute = Path::new(pattern).is_absolute();

    let first_meta = pattern.find(['*', '?', '[']).unwrap_or(pattern.len());
    let literal_root = pattern[..first_meta].rfind('/').map_or("", |end| &pattern[..end]);
    let root = base.join(literal_root);
    debug!("Searching for pattern '{}' in {}", pattern, root.display());

    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
    {
        let candidate = if absolute {
            entry.path().to_string_lossy().into_owned()
        } else {
            match entry.path().strip_prefix(base) {
                Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            }
        };

        trace!("Checking path: {}", candidate);
        if matcher.matches_with(&candidate, MATCH_OPTIONS) {
            matches.push(candidate);
        }
    }

    debug!("Found {} matches for pattern '{}'", matches.len(), pattern);
    Ok(matches)
}
