//! Test utilities for asset-deps
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] to see `tracing` output in tests
//! - [`TestProject`] for temporary project directories
//! - capability stubs that count how often they are called
//!
//! # Example
//!
//! ```rust,no_run
//! use asset_deps::test_utils::TestProject;
//!
//! let project = TestProject::builder()
//!     .with_file("js/app.js", "console.log(1)")
//!     .build()
//!     .unwrap();
//! assert!(project.path().join("js/app.js").exists());
//! ```

mod project;

pub use project::{TestProject, TestProjectBuilder};

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::require::RequireExtensionOptions;
use crate::types::{Content, TypeBundle};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` when set, otherwise leaves
/// logging off. Only the first call has an effect.
///
/// ```bash
/// RUST_LOG=asset_deps=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Shared call counter.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call.
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Calls so far.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A type whose content is always `text`.
pub fn text_type(text: &'static str) -> TypeBundle {
    TypeBundle::new().read(move |_dep| async move { Ok(text.to_string()) })
}

/// Require extension options reading `text` whose last-modified lookup
/// returns `modified` and counts its calls on `counter`.
pub fn counting_require_options(
    text: &'static str,
    modified: i64,
    counter: &CallCounter,
) -> RequireExtensionOptions {
    let counter = counter.clone();
    RequireExtensionOptions::new()
        .read(move |_path, _ctx| async move { Ok(Content::Text(text.to_string())) })
        .get_last_modified(move |_path, _ctx| {
            let counter = counter.clone();
            async move {
                // Let other consumers queue up before settling
                tokio::task::yield_now().await;
                counter.hit();
                Ok(modified)
            }
        })
}
