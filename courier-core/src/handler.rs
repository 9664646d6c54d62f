//! # Handlers
//!
//! A handler is the single function bound to an action. It performs the
//! action's effect and produces the value returned to the caller.
//!
//! Handlers see the command by shared reference. Whatever they return is
//! wrapped by the innermost step of the chain: `Ok(v)` becomes
//! `Outcome::Success(v)`, while an `Err` or a panic becomes a failing
//! outcome. A handler failure never escapes a dispatch.
//!
//! # Usage Patterns
//!
//! 1. **Struct implementation**: `impl Handler<Cart, (), Total> for AddItem`
//! 2. **Closure**: `dispatcher.register_fn("cart.add", |cmd| Ok(...))`, wrapped in [`FnHandler`]
//! 3. **Async**: implement [`AsyncHandler`] with an `async fn`, or register a
//!    closure returning a [`BoxFuture`] through [`AsyncFnHandler`]

use crate::{command::Command, error::BoxError, message::Message};
use futures::future::BoxFuture;
use std::future::Future;

/// The blocking handler contract.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle commands of type `Command<{T}, {P}>`",
    label = "missing `Handler<{T}, {P}, {V}>` implementation",
    note = "Handlers must implement `handle` and return `Result<{V}, BoxError>`."
)]
pub trait Handler<T, P, V>: Send + Sync + 'static {
    /// Perform the action.
    fn handle(&self, command: &Command<T, P>) -> Result<V, BoxError>;
}

/// Adapter that turns a closure into a [`Handler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> Handler<T, P, V> for FnHandler<F>
where
    F: Fn(&Command<T, P>) -> Result<V, BoxError> + Send + Sync + 'static,
{
    fn handle(&self, command: &Command<T, P>) -> Result<V, BoxError> {
        (self.0)(command)
    }
}

/// The suspension-capable handler contract.
///
/// This trait uses native `async fn` for static dispatch. Dispatchers store
/// handlers as [`DynAsyncHandler`] trait objects, which every `AsyncHandler`
/// implements automatically.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle commands of type `Command<{T}, {P}>` asynchronously",
    label = "missing `AsyncHandler<{T}, {P}, {V}>` implementation",
    note = "Async handlers must implement `handle` returning a `Send` future."
)]
pub trait AsyncHandler<T, P, V>: Send + Sync + 'static {
    /// Perform the action.
    fn handle(&self, command: &Command<T, P>)
    -> impl Future<Output = Result<V, BoxError>> + Send;
}

/// Object-safe version of [`AsyncHandler`].
pub trait DynAsyncHandler<T, P, V>: Send + Sync + 'static {
    /// Perform the action (dynamic dispatch version).
    fn handle_dyn<'a>(&'a self, command: &'a Command<T, P>) -> BoxFuture<'a, Result<V, BoxError>>;
}

impl<T, P, V, H> DynAsyncHandler<T, P, V> for H
where
    T: Message,
    P: Message,
    V: Message,
    H: AsyncHandler<T, P, V>,
{
    fn handle_dyn<'a>(&'a self, command: &'a Command<T, P>) -> BoxFuture<'a, Result<V, BoxError>> {
        Box::pin(self.handle(command))
    }
}

/// Adapter that turns a closure returning a boxed future into an
/// [`AsyncHandler`].
///
/// ```rust,ignore
/// dispatcher.register_fn("item.double", |cmd| {
///     Box::pin(async move {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         Ok(cmd.target * 2)
///     })
/// });
/// ```
pub struct AsyncFnHandler<F>(F);

impl<F> AsyncFnHandler<F> {
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, P, V, F> AsyncHandler<T, P, V> for AsyncFnHandler<F>
where
    T: Message,
    P: Message,
    V: Message,
    F: for<'a> Fn(&'a Command<T, P>) -> BoxFuture<'a, Result<V, BoxError>>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        command: &Command<T, P>,
    ) -> impl Future<Output = Result<V, BoxError>> + Send {
        (self.0)(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    impl AsyncHandler<i32, (), i32> for Double {
        async fn handle(&self, command: &Command<i32>) -> Result<i32, BoxError> {
            Ok(command.target * 2)
        }
    }

    #[test]
    fn test_fn_handler() {
        let handler = FnHandler::new(|cmd: &Command<i32>| Ok::<_, BoxError>(cmd.target + 1));
        let command = Command::new("inc", 1);
        assert_eq!(handler.handle(&command).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_async_handler_through_dyn() {
        let handler: Box<dyn DynAsyncHandler<i32, (), i32>> = Box::new(Double);
        let command = Command::new("double", 5);
        assert_eq!(handler.handle_dyn(&command).await.unwrap(), 10);
    }
}
