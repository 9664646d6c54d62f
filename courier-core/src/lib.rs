//! # courier-core
//!
//! Core contracts for the Courier command dispatch framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins and extensions that don't need the dispatchers from `courier`.
//!
//! # Dispatch Model
//!
//! A dispatch turns `(action, target, payload)` into an [`Outcome`]:
//!
//! 1. **Construct**: a [`Command`] is built and shared by reference for the
//!    rest of the dispatch.
//! 2. **Resolve**: the [`HandlerRegistry`] looks up the single handler bound
//!    to the action.
//! 3. **Build chain**: the plugins registered at this moment are snapshotted
//!    and composed around the handler call via [`Next`] / [`AsyncNext`].
//! 4. **Execute**: the outermost plugin runs first. Handler failures become
//!    failing outcomes; plugin body failures escape as [`DispatchError`].
//! 5. **Notify**: every after-dispatch hook observes the outcome; hook
//!    failures go to a [`DiagnosticSink`].
//! 6. **Return**: the outcome from step 4.
//!
//! ## Contracts
//!
//! | Role | Blocking | Suspension-capable |
//! |---|---|---|
//! | Handler | [`Handler`] | [`AsyncHandler`] / [`DynAsyncHandler`] |
//! | Plugin | [`Plugin`] + [`Next`] | [`AsyncPlugin`] / [`DynAsyncPlugin`] + [`AsyncNext`] |
//! | Hook | [`Hook`] | [`AsyncHook`] / [`DynAsyncHook`] |
//!
//! Closures are adapted with [`FnHandler`], [`FnPlugin`], [`FnHook`] and
//! their async counterparts.
//!
//! # Error Types
//!
//! - [`CommandError`] - Failure carried by an [`Outcome`]
//! - [`DispatchError`] - Plugin body failure escaping `dispatch`
//! - [`HookError`] - Contained hook failure

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod command;
mod error;
mod handler;
mod hook;
mod message;
mod outcome;
mod plugin;
mod registry;
mod sink;
mod subscription;

// Re-exports
pub use command::Command;
pub use error::{BoxError, CommandError, DispatchError, HookError, panic_message};
pub use handler::{AsyncFnHandler, AsyncHandler, DynAsyncHandler, FnHandler, Handler};
pub use hook::{AsyncFnHook, AsyncHook, DynAsyncHook, FnHook, Hook, notify, notify_async};
pub use message::Message;
pub use outcome::Outcome;
pub use plugin::{AsyncFnPlugin, AsyncNext, AsyncPlugin, DynAsyncPlugin, FnPlugin, Next, Plugin};
pub use registry::{HandlerRegistry, OrderedList, Registered};
pub use sink::{DiagnosticSink, TracingSink};
pub use subscription::{Detach, Subscription, Token};

/// A boxed, `Send` future; the return type of async closure adapters.
pub use futures::future::BoxFuture;
