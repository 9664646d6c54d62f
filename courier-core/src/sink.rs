//! Diagnostic sink for contained hook failures.

use crate::error::HookError;

/// Receives after-dispatch hook failures.
///
/// A failing hook never affects the dispatch outcome; the failure is handed
/// to the dispatcher's sink and the remaining hooks still run.
///
/// Closures `Fn(&HookError)` implement this trait.
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Report one contained failure.
    fn report(&self, error: &HookError);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&HookError) + Send + Sync + 'static,
{
    fn report(&self, error: &HookError) {
        (self)(error)
    }
}

/// The default sink: emits a `tracing` error event per failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, error: &HookError) {
        tracing::error!(action = %error.action(), error = %error, "after-dispatch hook failed");
    }
}
