//! Exposing dispatch progress through get/set cells.
//!
//! A UI layer usually wants three observable values per operation: whether it
//! is running, the last error, and the last result. [`CommandState`] keeps
//! them in [`StateCell`]s and updates them around a dispatch. Any reactive
//! primitive with a getter and a setter can stand in for [`SharedCell`].

use courier_core::{DispatchError, Outcome};
use parking_lot::RwLock;
use std::{fmt, future::Future, sync::Arc};

/// A minimal get/set cell.
pub trait StateCell<T>: Send + Sync {
    /// Read the current value.
    fn get(&self) -> T;

    /// Replace the current value.
    fn set(&self, value: T);
}

/// A thread-safe [`StateCell`]; clones share the value.
pub struct SharedCell<T> {
    value: Arc<RwLock<T>>,
}

impl<T> SharedCell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Update the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.write());
    }
}

impl<T: Clone + Send + Sync> StateCell<T> for SharedCell<T> {
    fn get(&self) -> T {
        self.value.read().clone()
    }

    fn set(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T> Clone for SharedCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: Default> Default for SharedCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedCell").field(&*self.value.read()).finish()
    }
}

/// Loading, error and value cells tracking one kind of dispatch.
///
/// While a tracked dispatch runs, `loading` is `true` and `error` is cleared.
/// When it finishes, a success stores the value, a failing outcome or a
/// dispatch error stores its message, and `loading` goes back to `false`.
/// The previous value is kept when a dispatch fails. `loading` is also reset
/// when the dispatch panics or the `track_async` future is dropped early.
///
/// # Example
///
/// ```rust,ignore
/// let state = CommandState::new();
/// let outcome = state.track(|| bus.dispatch("cart.total", cart.clone()))?;
/// assert!(!state.loading());
/// assert_eq!(state.value(), outcome.into_value());
/// ```
pub struct CommandState<V> {
    loading: Arc<dyn StateCell<bool>>,
    error: Arc<dyn StateCell<Option<String>>>,
    value: Arc<dyn StateCell<Option<V>>>,
}

impl<V: Clone + Send + Sync + 'static> CommandState<V> {
    /// Create a state backed by [`SharedCell`]s.
    pub fn new() -> Self {
        Self::with_cells(
            SharedCell::new(false),
            SharedCell::new(None),
            SharedCell::new(None),
        )
    }

    /// Create a state backed by caller-provided cells.
    pub fn with_cells(
        loading: impl StateCell<bool> + 'static,
        error: impl StateCell<Option<String>> + 'static,
        value: impl StateCell<Option<V>> + 'static,
    ) -> Self {
        Self {
            loading: Arc::new(loading),
            error: Arc::new(error),
            value: Arc::new(value),
        }
    }

    /// Returns `true` while a tracked dispatch is running.
    pub fn loading(&self) -> bool {
        self.loading.get()
    }

    /// The message of the last failure, if the last dispatch failed.
    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    /// The value of the last successful dispatch.
    pub fn value(&self) -> Option<V> {
        self.value.get()
    }

    /// Run a blocking dispatch while updating the cells.
    pub fn track<F>(&self, dispatch: F) -> Result<Outcome<V>, DispatchError>
    where
        F: FnOnce() -> Result<Outcome<V>, DispatchError>,
    {
        let _loading = self.start();
        let result = dispatch();
        self.finish(&result);
        result
    }

    /// Await a dispatch while updating the cells.
    pub async fn track_async<F>(&self, dispatch: F) -> Result<Outcome<V>, DispatchError>
    where
        F: Future<Output = Result<Outcome<V>, DispatchError>>,
    {
        let _loading = self.start();
        let result = dispatch.await;
        self.finish(&result);
        result
    }

    fn start(&self) -> LoadingGuard<'_> {
        self.loading.set(true);
        self.error.set(None);
        LoadingGuard(self.loading.as_ref())
    }

    fn finish(&self, result: &Result<Outcome<V>, DispatchError>) {
        match result {
            Ok(Outcome::Success(value)) => self.value.set(Some(value.clone())),
            Ok(Outcome::Failure(err)) => self.error.set(Some(err.to_string())),
            Err(err) => self.error.set(Some(err.to_string())),
        }
    }
}

/// Clears `loading` when a tracked dispatch ends, including by unwinding or
/// by the tracking future being dropped.
struct LoadingGuard<'a>(&'a dyn StateCell<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<V: Clone + Send + Sync + 'static> Default for CommandState<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for CommandState<V> {
    fn clone(&self) -> Self {
        Self {
            loading: Arc::clone(&self.loading),
            error: Arc::clone(&self.error),
            value: Arc::clone(&self.value),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CommandState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandState")
            .field("loading", &self.loading.get())
            .field("error", &self.error.get())
            .field("value", &self.value.get())
            .finish()
    }
}
