//! Error types for Courier.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`CommandError`] - Why a dispatch produced a failing [`Outcome`]
//! - [`DispatchError`] - A plugin body failed; the only error `dispatch` itself returns
//! - [`HookError`] - A contained after-dispatch hook failure, sent to a [`DiagnosticSink`]
//!
//! [`Outcome`]: crate::Outcome
//! [`DiagnosticSink`]: crate::DiagnosticSink

use std::any::Any;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The failure carried by a failing [`Outcome`](crate::Outcome).
///
/// Callers see the same shape whether the failure came from the handler or
/// from a plugin that short-circuited the chain.
#[derive(Error, Debug)]
pub enum CommandError {
    /// No handler is bound to the dispatched action.
    #[error("no handler for {action}")]
    NoHandler {
        /// The action that was dispatched.
        action: String,
    },

    /// The handler returned an error.
    #[error(transparent)]
    Handler(BoxError),

    /// A plugin stopped the dispatch without reaching the handler.
    #[error("{0}")]
    Rejected(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    /// Create a [`CommandError::Rejected`] with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        CommandError::Rejected(reason.into())
    }

    /// Returns `true` if no handler was bound to the action.
    pub fn is_no_handler(&self) -> bool {
        matches!(self, CommandError::NoHandler { .. })
    }

    /// Returns `true` if a plugin rejected the command.
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandError::Rejected(_))
    }

    /// Returns `true` if the failure was raised while the handler ran.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, CommandError::Handler(_) | CommandError::Panicked(_))
    }
}

/// Errors that escape a dispatch.
///
/// Handler failures never end up here; they become failing outcomes. Only a
/// plugin whose own logic fails without containing the error does.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A plugin returned an error from its own body.
    #[error("plugin failed: {0}")]
    Plugin(#[source] BoxError),
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Plugin(err)
    }
}

/// A failure raised by an after-dispatch hook.
///
/// Hook failures are contained: they are reported to the dispatcher's
/// diagnostic sink and never reach the caller.
#[derive(Error, Debug)]
pub enum HookError {
    /// The hook returned an error.
    #[error("hook failed after `{action}`: {source}")]
    Failed {
        /// The action of the dispatch the hook observed.
        action: String,
        /// The error returned by the hook.
        #[source]
        source: BoxError,
    },

    /// The hook panicked.
    #[error("hook panicked after `{action}`: {message}")]
    Panicked {
        /// The action of the dispatch the hook observed.
        action: String,
        /// The panic message, if one could be recovered.
        message: String,
    },
}

impl HookError {
    /// The action of the dispatch during which the hook failed.
    pub fn action(&self) -> &str {
        match self {
            HookError::Failed { action, .. } | HookError::Panicked { action, .. } => action,
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "opaque panic payload".to_string(),
        },
    }
}
