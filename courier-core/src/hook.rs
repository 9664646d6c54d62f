//! # After-dispatch hooks
//!
//! Hooks observe the final outcome of a dispatch. They run once per
//! dispatch, in registration order, after the plugin chain has produced its
//! outcome and before `dispatch` returns, whether the outcome succeeded or
//! not.
//!
//! Hooks form an isolated failure domain: an error or panic in one hook is
//! reported to the [`DiagnosticSink`] and the next hook runs as usual. The
//! outcome handed back to the caller is never affected.

use crate::{
    command::Command,
    error::{BoxError, HookError, panic_message},
    message::Message,
    outcome::Outcome,
    registry::Registered,
    sink::DiagnosticSink,
};
use futures::{FutureExt, future::BoxFuture};
use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
};

/// The blocking hook contract.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Hook` for `Command<{T}, {P}>`",
    label = "missing `Hook<{T}, {P}, {V}>` implementation",
    note = "Hooks must implement `after(&self, &Command, &Outcome)`."
)]
pub trait Hook<T, P, V>: Send + Sync + 'static {
    /// Observe a finished dispatch.
    fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError>;
}

/// Adapter that turns a closure into a [`Hook`].
pub struct FnHook<F>(F);

impl<F> FnHook<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> Hook<T, P, V> for FnHook<F>
where
    F: Fn(&Command<T, P>, &Outcome<V>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError> {
        (self.0)(command, outcome)
    }
}

/// The suspension-capable hook contract.
pub trait AsyncHook<T, P, V>: Send + Sync + 'static {
    /// Observe a finished dispatch.
    fn after(
        &self,
        command: &Command<T, P>,
        outcome: &Outcome<V>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`AsyncHook`].
pub trait DynAsyncHook<T, P, V>: Send + Sync + 'static {
    /// Observe a finished dispatch (dynamic dispatch version).
    fn after_dyn<'a>(
        &'a self,
        command: &'a Command<T, P>,
        outcome: &'a Outcome<V>,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<T, P, V, K> DynAsyncHook<T, P, V> for K
where
    T: Message,
    P: Message,
    V: Message,
    K: AsyncHook<T, P, V>,
{
    fn after_dyn<'a>(
        &'a self,
        command: &'a Command<T, P>,
        outcome: &'a Outcome<V>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.after(command, outcome))
    }
}

/// Adapter that turns a closure returning a boxed future into an
/// [`AsyncHook`].
pub struct AsyncFnHook<F>(F);

impl<F> AsyncFnHook<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> AsyncHook<T, P, V> for AsyncFnHook<F>
where
    T: Message,
    P: Message,
    V: Message,
    F: for<'a> Fn(&'a Command<T, P>, &'a Outcome<V>) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    fn after(
        &self,
        command: &Command<T, P>,
        outcome: &Outcome<V>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        async move { (self.0)(command, outcome).await }
    }
}

fn contain(
    action: &str,
    result: Result<Result<(), BoxError>, Box<dyn Any + Send>>,
) -> Option<HookError> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(source)) => Some(HookError::Failed {
            action: action.to_string(),
            source,
        }),
        Err(payload) => Some(HookError::Panicked {
            action: action.to_string(),
            message: panic_message(payload),
        }),
    }
}

/// Run every hook in order, reporting failures to `sink`.
pub fn notify<T, P, V>(
    hooks: &[Registered<dyn Hook<T, P, V>>],
    command: &Command<T, P>,
    outcome: &Outcome<V>,
    sink: &dyn DiagnosticSink,
) where
    T: Message,
    P: Message,
    V: Message,
{
    for hook in hooks {
        let result = panic::catch_unwind(AssertUnwindSafe(|| hook.get().after(command, outcome)));
        if let Some(err) = contain(&command.action, result) {
            sink.report(&err);
        }
    }
}

/// Run every async hook in order, awaiting each before the next, reporting
/// failures to `sink`.
pub async fn notify_async<T, P, V>(
    hooks: &[Registered<dyn DynAsyncHook<T, P, V>>],
    command: &Command<T, P>,
    outcome: &Outcome<V>,
    sink: &dyn DiagnosticSink,
) where
    T: Message,
    P: Message,
    V: Message,
{
    for hook in hooks {
        let result = AssertUnwindSafe(hook.get().after_dyn(command, outcome))
            .catch_unwind()
            .await;
        if let Some(err) = contain(&command.action, result) {
            sink.report(&err);
        }
    }
}
