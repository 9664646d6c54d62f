//! # Plugins (middleware)
//!
//! A plugin wraps the execution of everything registered after it, down to
//! the handler. It receives the command and a [`Next`] continuation and
//! decides whether, when, and how often to call it:
//!
//! - **zero times**: short-circuit; the outcome it returns becomes the
//!   dispatch outcome and neither the handler nor later plugins run
//! - **once**: the usual before/after middleware
//! - **several times**: re-execution, e.g. retry; each call re-enters the
//!   rest of the chain including the handler
//!
//! The first registered plugin is the outermost one: it sees the command
//! first and the final outcome last.
//!
//! # Error containment
//!
//! Only the innermost step (the handler call) converts failures into
//! outcomes. An `Err` returned by a plugin body travels outward through
//! every plugin that forwards it with `?` and leaves `dispatch` as a
//! [`DispatchError`](crate::DispatchError). A plugin that wants to turn such
//! a failure into an outcome matches on the result of `next.run(..)` itself.

use crate::{
    command::Command,
    error::{BoxError, CommandError, panic_message},
    handler::{DynAsyncHandler, Handler},
    message::Message,
    outcome::Outcome,
    registry::Registered,
};
use futures::{FutureExt, future::BoxFuture};
use std::{
    future::Future,
    panic::{self, AssertUnwindSafe},
};

/// The blocking middleware contract.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Plugin` for `Command<{T}, {P}>`",
    label = "missing `Plugin<{T}, {P}, {V}>` implementation",
    note = "Plugins must implement `handle(&self, &mut Command, Next)`."
)]
pub trait Plugin<T, P, V>: Send + Sync + 'static {
    /// Run this layer of the chain.
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: Next<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError>;
}

/// The innermost step: the resolved handler (if any) of the dispatched action.
struct Endpoint<'a, H: ?Sized> {
    action: &'a str,
    handler: Option<&'a H>,
}

impl<H: ?Sized> Clone for Endpoint<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: ?Sized> Copy for Endpoint<'_, H> {}

/// Continuation invoking the remainder of a blocking chain.
///
/// `Next` is `Copy`; calling [`run`](Next::run) more than once re-enters the
/// rest of the chain each time.
pub struct Next<'a, T, P, V> {
    plugins: &'a [Registered<dyn Plugin<T, P, V>>],
    endpoint: Endpoint<'a, dyn Handler<T, P, V>>,
}

impl<T, P, V> Clone for Next<'_, T, P, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P, V> Copy for Next<'_, T, P, V> {}

impl<'a, T, P, V> Next<'a, T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    /// Build the chain for one dispatch.
    ///
    /// `plugins` is the snapshot taken when the dispatch started; `handler`
    /// is the handler resolved for `action`, if any.
    pub fn new(
        plugins: &'a [Registered<dyn Plugin<T, P, V>>],
        action: &'a str,
        handler: Option<&'a (dyn Handler<T, P, V> + 'static)>,
    ) -> Self {
        Self {
            plugins,
            endpoint: Endpoint { action, handler },
        }
    }

    /// Number of plugins left before the handler.
    pub fn remaining(&self) -> usize {
        self.plugins.len()
    }

    /// Invoke the rest of the chain.
    pub fn run(self, command: &mut Command<T, P>) -> Result<Outcome<V>, BoxError> {
        match self.plugins.split_first() {
            Some((first, rest)) => first.get().handle(
                command,
                Next {
                    plugins: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => Ok(invoke(self.endpoint, command)),
        }
    }
}

fn invoke<T, P, V>(
    endpoint: Endpoint<'_, dyn Handler<T, P, V>>,
    command: &Command<T, P>,
) -> Outcome<V>
where
    T: Message,
    P: Message,
    V: Message,
{
    let Some(handler) = endpoint.handler else {
        return Outcome::no_handler(endpoint.action);
    };
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(command))) {
        Ok(Ok(value)) => Outcome::Success(value),
        Ok(Err(err)) => Outcome::Failure(CommandError::Handler(err)),
        Err(payload) => Outcome::Failure(CommandError::Panicked(panic_message(payload))),
    }
}

/// Adapter that turns a closure into a [`Plugin`].
pub struct FnPlugin<F>(F);

impl<F> FnPlugin<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> Plugin<T, P, V> for FnPlugin<F>
where
    F: Fn(&mut Command<T, P>, Next<'_, T, P, V>) -> Result<Outcome<V>, BoxError>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: Next<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        (self.0)(command, next)
    }
}

// ============================================================================
// Async
// ============================================================================

/// The suspension-capable middleware contract.
///
/// Same ordering guarantees as [`Plugin`]: "before" logic runs in
/// registration order and "after" logic in reverse, even when layers suspend.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `AsyncPlugin` for `Command<{T}, {P}>`",
    label = "missing `AsyncPlugin<{T}, {P}, {V}>` implementation",
    note = "Async plugins must implement `handle(&self, &mut Command, AsyncNext)`."
)]
pub trait AsyncPlugin<T, P, V>: Send + Sync + 'static {
    /// Run this layer of the chain.
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: AsyncNext<'_, T, P, V>,
    ) -> impl Future<Output = Result<Outcome<V>, BoxError>> + Send;
}

/// Object-safe version of [`AsyncPlugin`].
pub trait DynAsyncPlugin<T, P, V>: Send + Sync + 'static {
    /// Run this layer of the chain (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        command: &'a mut Command<T, P>,
        next: AsyncNext<'a, T, P, V>,
    ) -> BoxFuture<'a, Result<Outcome<V>, BoxError>>;
}

impl<T, P, V, Pl> DynAsyncPlugin<T, P, V> for Pl
where
    T: Message,
    P: Message,
    V: Message,
    Pl: AsyncPlugin<T, P, V>,
{
    fn handle_dyn<'a>(
        &'a self,
        command: &'a mut Command<T, P>,
        next: AsyncNext<'a, T, P, V>,
    ) -> BoxFuture<'a, Result<Outcome<V>, BoxError>> {
        Box::pin(self.handle(command, next))
    }
}

/// Continuation invoking the remainder of an async chain.
///
/// The returned future must be awaited before the calling plugin proceeds.
pub struct AsyncNext<'a, T, P, V> {
    plugins: &'a [Registered<dyn DynAsyncPlugin<T, P, V>>],
    endpoint: Endpoint<'a, dyn DynAsyncHandler<T, P, V>>,
}

impl<T, P, V> Clone for AsyncNext<'_, T, P, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P, V> Copy for AsyncNext<'_, T, P, V> {}

impl<'a, T, P, V> AsyncNext<'a, T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    /// Build the chain for one dispatch.
    pub fn new(
        plugins: &'a [Registered<dyn DynAsyncPlugin<T, P, V>>],
        action: &'a str,
        handler: Option<&'a (dyn DynAsyncHandler<T, P, V> + 'static)>,
    ) -> Self {
        Self {
            plugins,
            endpoint: Endpoint { action, handler },
        }
    }

    /// Number of plugins left before the handler.
    pub fn remaining(&self) -> usize {
        self.plugins.len()
    }

    /// Invoke the rest of the chain.
    pub fn run<'c>(
        self,
        command: &'c mut Command<T, P>,
    ) -> BoxFuture<'c, Result<Outcome<V>, BoxError>>
    where
        'a: 'c,
    {
        match self.plugins.split_first() {
            Some((first, rest)) => first.get().handle_dyn(
                command,
                AsyncNext {
                    plugins: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => {
                let endpoint = self.endpoint;
                Box::pin(async move { Ok(invoke_async(endpoint, command).await) })
            }
        }
    }
}

async fn invoke_async<T, P, V>(
    endpoint: Endpoint<'_, dyn DynAsyncHandler<T, P, V>>,
    command: &Command<T, P>,
) -> Outcome<V>
where
    T: Message,
    P: Message,
    V: Message,
{
    let Some(handler) = endpoint.handler else {
        return Outcome::no_handler(endpoint.action);
    };
    match AssertUnwindSafe(handler.handle_dyn(command))
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => Outcome::Success(value),
        Ok(Err(err)) => Outcome::Failure(CommandError::Handler(err)),
        Err(payload) => Outcome::Failure(CommandError::Panicked(panic_message(payload))),
    }
}

/// Adapter that turns a closure returning a boxed future into an
/// [`AsyncPlugin`].
///
/// ```rust,ignore
/// dispatcher.use_fn(|cmd, next| {
///     Box::pin(async move {
///         tracing::info!(action = %cmd.action, "before");
///         let outcome = next.run(cmd).await?;
///         tracing::info!(ok = outcome.is_ok(), "after");
///         Ok(outcome)
///     })
/// });
/// ```
pub struct AsyncFnPlugin<F>(F);

impl<F> AsyncFnPlugin<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> AsyncPlugin<T, P, V> for AsyncFnPlugin<F>
where
    T: Message,
    P: Message,
    V: Message,
    F: for<'a> Fn(
            &'a mut Command<T, P>,
            AsyncNext<'a, T, P, V>,
        ) -> BoxFuture<'a, Result<Outcome<V>, BoxError>>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: AsyncNext<'_, T, P, V>,
    ) -> impl Future<Output = Result<Outcome<V>, BoxError>> + Send {
        async move { (self.0)(command, next).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handler::FnHandler, registry::OrderedList};
    use std::sync::{Arc, Mutex};

    struct Tag {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin<i32, (), i32> for Tag {
        fn handle(
            &self,
            command: &mut Command<i32>,
            next: Next<'_, i32, (), i32>,
        ) -> Result<Outcome<i32>, BoxError> {
            self.log.lock().unwrap().push(format!("{}-before", self.name));
            let outcome = next.run(command)?;
            self.log.lock().unwrap().push(format!("{}-after", self.name));
            Ok(outcome)
        }
    }

    fn plugins(log: &Arc<Mutex<Vec<String>>>) -> OrderedList<dyn Plugin<i32, (), i32>> {
        let list: OrderedList<dyn Plugin<i32, (), i32>> = OrderedList::new();
        for name in ["p1", "p2"] {
            list.push(Arc::new(Tag {
                name,
                log: log.clone(),
            }));
        }
        list
    }

    #[test]
    fn test_chain_runs_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let list = plugins(&log);
        let snapshot = list.snapshot();

        let inner_log = log.clone();
        let handler = FnHandler::new(move |cmd: &Command<i32>| {
            inner_log.lock().unwrap().push("handler".to_string());
            Ok::<_, BoxError>(cmd.target)
        });

        let mut command = Command::new("echo", 7);
        let outcome = Next::new(&snapshot, "echo", Some(&handler as &dyn Handler<i32, (), i32>))
            .run(&mut command)
            .unwrap();

        assert_eq!(outcome.value(), Some(&7));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["p1-before", "p2-before", "handler", "p2-after", "p1-after"]
        );
    }

    #[test]
    fn test_missing_handler_yields_no_handler() {
        let mut command = Command::new("ghost", 0);
        let outcome = Next::<i32, (), i32>::new(&[], "ghost", None)
            .run(&mut command)
            .unwrap();
        assert!(outcome.error().is_some_and(CommandError::is_no_handler));
    }

    #[test]
    fn test_handler_panic_is_captured() {
        let handler = FnHandler::new(|_: &Command<i32>| -> Result<i32, BoxError> {
            panic!("kaboom")
        });
        let mut command = Command::new("explode", 0);
        let outcome = Next::new(&[], "explode", Some(&handler as &dyn Handler<i32, (), i32>))
            .run(&mut command)
            .unwrap();
        assert_eq!(
            outcome.error().map(ToString::to_string).as_deref(),
            Some("handler panicked: kaboom")
        );
    }
}
