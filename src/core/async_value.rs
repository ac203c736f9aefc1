//! Single-flight memoized asynchronous results.
//!
//! An [`AsyncValue`] starts out pending and settles exactly once, either
//! resolved with a value or rejected with an error. Consumers subscribe with
//! [`AsyncValue::done`] (callback style) or [`AsyncValue::subscribe`] (a
//! receiver that can be awaited). Subscriptions made before settlement are
//! queued and flushed in registration order; subscriptions made afterwards
//! fire immediately. Every subscriber observes the one outcome exactly once.
//!
//! # Examples
//!
//! ```rust
//! use asset_deps::core::AsyncValue;
//!
//! let value: AsyncValue<u32, String> = AsyncValue::new();
//! value.done(|outcome| assert_eq!(outcome, Ok(1)));
//!
//! assert!(value.resolve(1));
//! assert!(!value.resolve(2)); // first settlement wins
//!
//! value.done(|outcome| assert_eq!(outcome, Ok(1)));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Subscriber<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

enum State<T, E> {
    Pending(Vec<Subscriber<T, E>>),
    Settled(Result<T, E>),
}

/// A value that settles at most once and fans its outcome out to subscribers.
///
/// Cloning an `AsyncValue` yields another handle to the same cell.
pub struct AsyncValue<T, E> {
    state: Arc<Mutex<State<T, E>>>,
}

impl<T, E> Clone for AsyncValue<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Default for AsyncValue<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for AsyncValue<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match &*lock(&self.state) {
            State::Pending(queue) => format!("pending ({} subscribers)", queue.len()),
            State::Settled(Ok(_)) => "resolved".to_string(),
            State::Settled(Err(_)) => "rejected".to_string(),
        };
        f.debug_struct("AsyncValue").field("state", &status).finish()
    }
}

fn lock<T, E>(state: &Mutex<State<T, E>>) -> MutexGuard<'_, State<T, E>> {
    // Subscribers never run while the lock is held, so a poisoned lock still
    // holds a consistent state.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, E> AsyncValue<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create a pending value with no subscribers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending(Vec::new()))),
        }
    }

    /// Settle with a value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns `false` if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Whether the value has settled.
    pub fn is_settled(&self) -> bool {
        matches!(&*lock(&self.state), State::Settled(_))
    }

    /// Snapshot of the outcome, `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        match &*lock(&self.state) {
            State::Pending(_) => None,
            State::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// Register a callback for the outcome.
    ///
    /// Runs immediately when already settled, otherwise after the callbacks
    /// registered before it once the value settles.
    pub fn done<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let settled = {
            let mut state = lock(&self.state);
            match &mut *state {
                State::Pending(queue) => {
                    queue.push(Box::new(callback));
                    return;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };
        callback(settled);
    }

    /// Subscribe with a receiver that yields the outcome once.
    ///
    /// The receiver errors only if every handle to this value is dropped
    /// before it settles.
    pub fn subscribe(&self) -> oneshot::Receiver<Result<T, E>> {
        let (tx, rx) = oneshot::channel();
        self.done(move |outcome| {
            // The receiver may have been dropped by a consumer that lost interest
            let _ = tx.send(outcome);
        });
        rx
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let queue = {
            let mut state = lock(&self.state);
            match &mut *state {
                State::Settled(_) => return false,
                State::Pending(queue) => {
                    let queue = std::mem::take(queue);
                    *state = State::Settled(outcome.clone());
                    queue
                }
            }
        };

        for subscriber in queue {
            subscriber(outcome.clone());
        }
        true
    }
}
