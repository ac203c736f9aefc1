//! Descriptor normalization pipeline.
//!
//! A normalizer looks at one [`Descriptor`] and either leaves it alone,
//! replaces it, or expands it into several descriptors. The pipeline applies
//! the normalizers in a fixed order to every element of a list until each
//! element has passed all of them, then asks the type registry to turn it
//! into a [`Dependency`].
//!
//! # Order
//!
//! 1. the glob normalizer ([`glob`]), always first;
//! 2. user normalizers, most recently added first;
//! 3. the default normalizer ([`default`]), always last.
//!
//! # Algorithm
//!
//! The run is an explicit state machine over a cursor pair: `index` into the
//! list and `step` into the normalizers. Expansion splices the new elements
//! in place of the current one and restarts at step 0 on the first of them,
//! so every spliced element goes through the whole chain. Asynchronous
//! normalizers are awaited inline; the loop never recurses, however long the
//! chain or the list grows. Elements are finished strictly in list order.
//!
//! Any normalizer error aborts the run and no partial list is returned.
//! Expansion is not capped; a normalizer that keeps expanding its own output
//! never terminates.
//!
//! # Examples
//!
//! ```rust,no_run
//! use asset_deps::normalizer::{Normalized, Normalizer};
//! use asset_deps::dependency::Descriptor;
//!
//! // Expand "bundle:core" into its members
//! let bundles = Normalizer::new("bundles", |descriptor, _ctx| {
//!     Ok(match descriptor {
//!         Descriptor::Path(path) if path == "bundle:core" => Normalized::Expanded(vec![
//!             Descriptor::from("js:core/a.js"),
//!             Descriptor::from("js:core/b.js"),
//!         ]),
//!         _ => Normalized::Unchanged,
//!     })
//! });
//! ```

pub mod default;
pub mod glob;

pub use default::{default_normalizer, parse_type_prefix};
pub use glob::glob_normalizer;

use anyhow::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::AssetDepsError;
use crate::dependency::{Dependency, DependencyContext, DependencySpec, Descriptor};
use crate::types::TypeRegistry;

/// What a normalizer did with a descriptor.
#[derive(Debug, Clone)]
pub enum Normalized {
    /// Nothing to do; move on to the next normalizer.
    Unchanged,
    /// Use this descriptor instead and move on to the next normalizer.
    Replaced(Descriptor),
    /// Splice these descriptors in place of the current one and start over
    /// with the first of them. An empty list removes the descriptor.
    Expanded(Vec<Descriptor>),
}

/// Synchronous transformation.
pub type SyncNormalizeFn =
    Arc<dyn Fn(&Descriptor, &DependencyContext) -> Result<Normalized> + Send + Sync>;

/// Asynchronous transformation.
pub type AsyncNormalizeFn = Arc<
    dyn Fn(Descriptor, DependencyContext) -> BoxFuture<'static, Result<Normalized>> + Send + Sync,
>;

/// The two shapes a normalizer can take.
#[derive(Clone)]
pub enum NormalizeFn {
    /// Completes before returning.
    Sync(SyncNormalizeFn),
    /// Completes later.
    Async(AsyncNormalizeFn),
}

/// A named pipeline step.
#[derive(Clone)]
pub struct Normalizer {
    name: String,
    transform: NormalizeFn,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("name", &self.name)
            .field("async", &self.is_async())
            .finish()
    }
}

impl Normalizer {
    /// A synchronous normalizer.
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Descriptor, &DependencyContext) -> Result<Normalized> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: NormalizeFn::Sync(Arc::new(transform)),
        }
    }

    /// An asynchronous normalizer. It receives owned copies of the descriptor
    /// and context.
    pub fn new_async<F, Fut>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Descriptor, DependencyContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Normalized>> + Send + 'static,
    {
        Self {
            name: name.into(),
            transform: NormalizeFn::Async(Arc::new(
                move |descriptor: Descriptor,
                      ctx: DependencyContext|
                      -> BoxFuture<'static, Result<Normalized>> {
                    Box::pin(transform(descriptor, ctx))
                },
            )),
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the normalizer completes asynchronously.
    pub fn is_async(&self) -> bool {
        matches!(self.transform, NormalizeFn::Async(_))
    }

    /// Applies the normalizer to one descriptor.
    pub async fn apply(&self, descriptor: &Descriptor, ctx: &DependencyContext) -> Result<Normalized> {
        match &self.transform {
            NormalizeFn::Sync(transform) => transform(descriptor, ctx),
            NormalizeFn::Async(transform) => transform(descriptor.clone(), ctx.clone()).await,
        }
    }
}

/// Cursor state of one pipeline run.
#[derive(Debug)]
struct PipelineRun {
    entries: Vec<Descriptor>,
    index: usize,
    step: usize,
}

impl PipelineRun {
    fn new(entries: Vec<Descriptor>) -> Self {
        Self {
            entries,
            index: 0,
            step: 0,
        }
    }

    fn has_current(&self) -> bool {
        self.index < self.entries.len()
    }

    fn current(&self) -> &Descriptor {
        &self.entries[self.index]
    }

    fn apply(&mut self, outcome: Normalized) {
        match outcome {
            Normalized::Unchanged => self.step += 1,
            Normalized::Replaced(descriptor) => {
                self.entries[self.index] = descriptor;
                self.step += 1;
            }
            Normalized::Expanded(descriptors) => {
                trace!("Expanding element {} into {} descriptors", self.index, descriptors.len());
                self.entries.splice(self.index..=self.index, descriptors);
                self.step = 0;
            }
        }
    }

    fn finish_current(&mut self, dependency: Arc<Dependency>) {
        self.entries[self.index] = Descriptor::Instance(dependency);
        self.index += 1;
        self.step = 0;
    }

    fn into_dependencies(self) -> Vec<Arc<Dependency>> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Descriptor::Instance(dependency) => Some(dependency),
                _ => None,
            })
            .collect()
    }
}

/// Runs `normalizers` over `descriptors` until every element is a dependency.
///
/// `normalizers` is used in the order given; callers assemble it as glob,
/// user normalizers (newest first), default.
///
/// # Errors
///
/// [`AssetDepsError::NormalizerFailed`] when a normalizer fails, or the type
/// registry's error when an element cannot be instantiated.
pub async fn run_pipeline(
    normalizers: &[Normalizer],
    types: &TypeRegistry,
    descriptors: Vec<Descriptor>,
    ctx: &DependencyContext,
) -> Result<Vec<Arc<Dependency>>> {
    if descriptors.is_empty() {
        return Ok(Vec::new());
    }
    debug!(
        "Normalizing {} descriptors in {} with {} normalizers",
        descriptors.len(),
        ctx.directory.display(),
        normalizers.len()
    );

    let mut run = PipelineRun::new(descriptors);
    while run.has_current() {
        if let Some(normalizer) = normalizers.get(run.step) {
            let outcome = match normalizer.apply(run.current(), ctx).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    return Err(AssetDepsError::NormalizerFailed {
                        normalizer: normalizer.name().to_string(),
                        descriptor: run.current().to_string(),
                        source,
                    }
                    .into());
                }
            };
            run.apply(outcome);
            continue;
        }

        let dependency = match run.current() {
            Descriptor::Instance(dependency) => Arc::clone(dependency),
            Descriptor::Spec(spec) => Arc::new(types.create_dependency((**spec).clone(), ctx)?),
            Descriptor::Path(path) => Arc::new(types.create_dependency(
                DependencySpec {
                    path: Some(path.clone()),
                    ..DependencySpec::default()
                },
                ctx,
            )?),
        };
        trace!("Element {} is {}:{}", run.index, dependency.type_name(), dependency.path());
        run.finish_current(dependency);
    }

    let dependencies = run.into_dependencies();
    debug!("Normalized into {} dependencies", dependencies.len());
    Ok(dependencies)
}
