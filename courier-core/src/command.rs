//! The command value flowing through a dispatch.

/// One request to perform a named action against a target.
///
/// A single `Command` is built at the start of each dispatch and shared by
/// reference across the whole plugin chain and every after-dispatch hook.
/// Plugins receive it as `&mut Command` and hand the same reference on to
/// the rest of the chain, so an in-place rewrite is visible to later
/// plugins, to the handler, and to hooks of that dispatch.
///
/// # Example
///
/// ```rust
/// use courier_core::Command;
///
/// let command = Command::new("cart.add", 3_u32).with_payload("express");
/// assert_eq!(command.action(), "cart.add");
/// assert_eq!(command.target, 3);
/// assert_eq!(command.payload, Some("express"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<T, P = ()> {
    /// Identifying name, conventionally namespaced (`domain.verb`).
    pub action: String,
    /// The data the action concerns.
    pub target: T,
    /// Optional auxiliary data.
    pub payload: Option<P>,
}

impl<T, P> Command<T, P> {
    /// Create a command without a payload.
    pub fn new(action: impl Into<String>, target: T) -> Self {
        Self {
            action: action.into(),
            target,
            payload: None,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The action name.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns `true` if the action lives in the given namespace.
    ///
    /// `"cart.add"` is in namespace `"cart"`; `"cartography.add"` is not.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.action
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}
