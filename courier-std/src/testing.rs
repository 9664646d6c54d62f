//! Testing utilities for Courier.
//!
//! This module provides building blocks for exercising dispatchers in tests.
//!
//! # Features
//!
//! - [`RecordingHook`]: A hook that records every outcome it observes
//! - [`CountingHandler`]: A handler that counts calls and returns a fixed value
//! - [`MarkerPlugin`]: A plugin that logs `<name>-before` / `<name>-after` markers
//! - [`FailingHook`]: A hook that always fails, by error or by panic
//! - [`CollectingSink`]: A diagnostic sink that keeps every reported failure
//!
//! Every utility implements both the blocking and the async contract.

use courier_core::{
    AsyncHandler, AsyncHook, AsyncNext, AsyncPlugin, BoxError, Command, DiagnosticSink, Handler,
    Hook, HookError, Message, Next, Outcome, Plugin,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// A shared, ordered log of string markers.
pub type MarkerLog = Arc<Mutex<Vec<String>>>;

/// Create an empty [`MarkerLog`].
pub fn marker_log() -> MarkerLog {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// Recording Hook
// ============================================================================

/// What a [`RecordingHook`] saw for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// The action of the command, after any plugin rewrite.
    pub action: String,
    /// The failure message, or `None` if the outcome succeeded.
    pub error: Option<String>,
}

impl Observation {
    /// Returns `true` if the observed outcome succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A hook that records every outcome it observes.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHook::new();
/// dispatcher.on_after(recorder.clone());
///
/// dispatcher.dispatch("ping", ())?;
/// assert_eq!(recorder.actions(), vec!["ping"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHook {
    observations: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingHook {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything observed so far, in order.
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().clone()
    }

    /// The observed actions, in order.
    pub fn actions(&self) -> Vec<String> {
        self.observations
            .lock()
            .iter()
            .map(|o| o.action.clone())
            .collect()
    }

    /// Number of observed dispatches.
    pub fn count(&self) -> usize {
        self.observations.lock().len()
    }

    /// Forget everything observed.
    pub fn clear(&self) {
        self.observations.lock().clear();
    }

    fn observe<T, P, V>(&self, command: &Command<T, P>, outcome: &Outcome<V>) {
        self.observations.lock().push(Observation {
            action: command.action.clone(),
            error: outcome.error().map(ToString::to_string),
        });
    }
}

impl<T: Message, P: Message, V: Message> Hook<T, P, V> for RecordingHook {
    fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError> {
        self.observe(command, outcome);
        Ok(())
    }
}

impl<T: Message, P: Message, V: Message> AsyncHook<T, P, V> for RecordingHook {
    async fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError> {
        self.observe(command, outcome);
        Ok(())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts its calls and returns a clone of a fixed value.
#[derive(Debug, Clone)]
pub struct CountingHandler<V> {
    calls: Arc<AtomicUsize>,
    value: V,
}

impl<V: Clone> CountingHandler<V> {
    /// Create a handler returning `value`.
    pub fn new(value: V) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            value,
        }
    }

    /// Number of calls so far, across all clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> V {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.value.clone()
    }
}

impl<T: Message, P: Message, V: Message + Clone> Handler<T, P, V> for CountingHandler<V> {
    fn handle(&self, _command: &Command<T, P>) -> Result<V, BoxError> {
        Ok(self.call())
    }
}

impl<T: Message, P: Message, V: Message + Clone> AsyncHandler<T, P, V> for CountingHandler<V> {
    async fn handle(&self, _command: &Command<T, P>) -> Result<V, BoxError> {
        Ok(self.call())
    }
}

// ============================================================================
// Marker Plugin
// ============================================================================

/// A pass-through plugin that writes `<name>-before` and `<name>-after` to a
/// shared log around the rest of the chain.
#[derive(Debug, Clone)]
pub struct MarkerPlugin {
    name: String,
    log: MarkerLog,
}

impl MarkerPlugin {
    /// Create a marker plugin writing to `log`.
    pub fn new(name: impl Into<String>, log: &MarkerLog) -> Self {
        Self {
            name: name.into(),
            log: Arc::clone(log),
        }
    }

    fn mark(&self, phase: &str) {
        self.log.lock().push(format!("{}-{phase}", self.name));
    }
}

impl<T: Message, P: Message, V: Message> Plugin<T, P, V> for MarkerPlugin {
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: Next<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        self.mark("before");
        let outcome = next.run(command)?;
        self.mark("after");
        Ok(outcome)
    }
}

impl<T: Message, P: Message, V: Message> AsyncPlugin<T, P, V> for MarkerPlugin {
    async fn handle(
        &self,
        command: &mut Command<T, P>,
        next: AsyncNext<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        self.mark("before");
        let outcome = next.run(command).await?;
        self.mark("after");
        Ok(outcome)
    }
}

// ============================================================================
// Failing Hook
// ============================================================================

/// A hook that always fails.
#[derive(Debug, Clone)]
pub struct FailingHook {
    message: String,
    panics: bool,
}

impl FailingHook {
    /// A hook returning an error with `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            panics: false,
        }
    }

    /// A hook panicking with `message`.
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            panics: true,
        }
    }

    fn fail(&self) -> Result<(), BoxError> {
        if self.panics {
            panic!("{}", self.message);
        }
        Err(self.message.clone().into())
    }
}

impl<T: Message, P: Message, V: Message> Hook<T, P, V> for FailingHook {
    fn after(&self, _command: &Command<T, P>, _outcome: &Outcome<V>) -> Result<(), BoxError> {
        self.fail()
    }
}

impl<T: Message, P: Message, V: Message> AsyncHook<T, P, V> for FailingHook {
    async fn after(&self, _command: &Command<T, P>, _outcome: &Outcome<V>) -> Result<(), BoxError> {
        self.fail()
    }
}

// ============================================================================
// Collecting Sink
// ============================================================================

/// A diagnostic sink keeping the message of every reported hook failure.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    reports: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reported messages, in order.
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, error: &HookError) {
        self.reports.lock().push(error.to_string());
    }
}
