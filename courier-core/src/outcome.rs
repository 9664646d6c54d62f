//! The result envelope every dispatch produces.

use crate::error::CommandError;

/// Outcome of one dispatch.
///
/// `Success` carries the value returned by the handler (or by a plugin that
/// answered on its behalf). `Failure` carries a [`CommandError`]: a missing
/// handler, a handler error or panic, or a plugin rejection. A handler that
/// returns nothing yields `Outcome::Success(())`.
#[derive(Debug)]
#[must_use]
pub enum Outcome<V> {
    /// The dispatch succeeded.
    Success(V),
    /// The dispatch failed.
    Failure(CommandError),
}

impl<V> Outcome<V> {
    /// A failing outcome for an unbound action.
    pub fn no_handler(action: impl Into<String>) -> Self {
        Outcome::Failure(CommandError::NoHandler {
            action: action.into(),
        })
    }

    /// A failing outcome produced by a plugin that refuses the command.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Outcome::Failure(CommandError::rejected(reason))
    }

    /// Returns `true` for [`Outcome::Success`].
    pub const fn is_ok(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns `true` for [`Outcome::Failure`].
    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&V> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&CommandError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Consume the outcome, keeping the success value.
    pub fn into_value(self) -> Option<V> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<V, CommandError> {
        self.into()
    }

    /// Map the success value.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }
}

impl<V> From<Result<V, CommandError>> for Outcome<V> {
    fn from(result: Result<V, CommandError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}

impl<V> From<Outcome<V>> for Result<V, CommandError> {
    fn from(outcome: Outcome<V>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_accessors() {
        let outcome = Outcome::Success(10);
        assert!(outcome.is_ok());
        assert_eq!(outcome.value(), Some(&10));
        assert!(outcome.error().is_none());
        assert_eq!(outcome.map(|v| v * 2).into_value(), Some(20));
    }

    #[test]
    fn test_rejected_keeps_reason() {
        let outcome: Outcome<()> = Outcome::rejected("Blocked");
        assert!(outcome.is_err());
        assert_eq!(outcome.error().map(ToString::to_string).as_deref(), Some("Blocked"));
        assert!(outcome.into_result().is_err());
    }
}
