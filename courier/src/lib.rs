//! # courier - Command Dispatch with Composable Middleware
//!
//! `courier` maps named actions to single handlers and runs every dispatch
//! through an ordered chain of plugins that can observe, rewrite,
//! short-circuit or retry it, followed by after-dispatch hooks that observe
//! the final outcome.
//!
//! Two dispatchers share one contract:
//!
//! - [`Dispatcher`]: blocking; `dispatch` returns a finished [`Outcome`].
//! - [`AsyncDispatcher`]: handlers, plugins and hooks may await; ordering
//!   guarantees are identical.
//!
//! ## Quick Start
//!
//! ```rust
//! use courier::prelude::*;
//!
//! let bus: Dispatcher<u32, (), u32> = Dispatcher::new();
//! bus.register_fn("stock.reserve", |cmd| Ok(cmd.target));
//!
//! // Outermost plugin: refuses empty reservations.
//! bus.use_fn(|cmd, next| {
//!     if cmd.target == 0 {
//!         return Ok(Outcome::rejected("nothing to reserve"));
//!     }
//!     next.run(cmd)
//! });
//!
//! assert!(bus.dispatch("stock.reserve", 0).unwrap().is_err());
//! assert_eq!(bus.dispatch("stock.reserve", 3).unwrap().value(), Some(&3));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod async_dispatcher;
mod dispatcher;
pub mod global;

pub use async_dispatcher::{AsyncDispatcher, AsyncDispatcherBuilder};
pub use dispatcher::{Dispatcher, DispatcherBuilder};

pub use courier_core::{
    // Adapters
    AsyncFnHandler,
    AsyncFnHook,
    AsyncFnPlugin,
    // Async contracts
    AsyncHandler,
    AsyncHook,
    AsyncNext,
    AsyncPlugin,
    // Errors
    BoxError,
    BoxFuture,
    // Data model
    Command,
    CommandError,
    // Diagnostics
    DiagnosticSink,
    DispatchError,
    DynAsyncHandler,
    DynAsyncHook,
    DynAsyncPlugin,
    FnHandler,
    FnHook,
    FnPlugin,
    // Blocking contracts
    Handler,
    Hook,
    HookError,
    Message,
    Next,
    Outcome,
    Plugin,
    // Registration
    Subscription,
    TracingSink,
};

/// Standard plugins, hooks and helpers.
pub mod plugins {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::plugins::*;
}

/// Undo/redo tracking of successful commands.
pub mod history {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::history::*;
}

/// Get/set cells for exposing dispatch state to a UI layer.
pub mod state {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::state::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::testing::*;
}

/// Prelude module - common imports for Courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AsyncDispatcher, AsyncHandler, AsyncHook, AsyncNext, AsyncPlugin, BoxError, Command,
        CommandError, DispatchError, Dispatcher, Handler, Hook, Next, Outcome, Plugin,
        Subscription,
    };
}
