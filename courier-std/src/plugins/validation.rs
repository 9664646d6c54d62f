//! Per-action precondition checks.

use courier_core::{
    AsyncNext, AsyncPlugin, BoxError, Command, Message, Next, Outcome, Plugin,
};
use std::{collections::HashMap, fmt};

type Rule<T, P> = Box<dyn Fn(&Command<T, P>) -> Result<(), String> + Send + Sync>;

/// A plugin that checks commands against rules registered per action.
///
/// Rules for an action run in registration order; the first failing rule
/// short-circuits the dispatch with a rejected outcome carrying its message.
/// Commands whose action has no rules pass through untouched.
///
/// # Example
///
/// ```rust
/// use courier_std::plugins::ValidationPlugin;
///
/// let validation = ValidationPlugin::<i64>::new()
///     .rule("account.withdraw", |cmd| {
///         if cmd.target > 0 { Ok(()) } else { Err("amount must be positive".into()) }
///     });
/// assert_eq!(validation.rule_count("account.withdraw"), 1);
/// ```
pub struct ValidationPlugin<T, P = ()> {
    rules: HashMap<String, Vec<Rule<T, P>>>,
}

impl<T, P> ValidationPlugin<T, P> {
    /// Create a plugin without rules.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Add a rule for `action`.
    pub fn rule<F>(mut self, action: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Command<T, P>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules
            .entry(action.into())
            .or_default()
            .push(Box::new(rule));
        self
    }

    /// Number of rules registered for `action`.
    pub fn rule_count(&self, action: &str) -> usize {
        self.rules.get(action).map_or(0, Vec::len)
    }

    fn check(&self, command: &Command<T, P>) -> Result<(), String> {
        let Some(rules) = self.rules.get(&command.action) else {
            return Ok(());
        };
        rules.iter().try_for_each(|rule| rule(command))
    }
}

impl<T, P> Default for ValidationPlugin<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> fmt::Debug for ValidationPlugin<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPlugin")
            .field("actions", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T, P, V> Plugin<T, P, V> for ValidationPlugin<T, P>
where
    T: Message,
    P: Message,
    V: Message,
{
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: Next<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        if let Err(reason) = self.check(command) {
            tracing::debug!(action = %command.action, %reason, "command rejected");
            return Ok(Outcome::rejected(reason));
        }
        next.run(command)
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for ValidationPlugin<T, P>
where
    T: Message,
    P: Message,
    V: Message,
{
    async fn handle(
        &self,
        command: &mut Command<T, P>,
        next: AsyncNext<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        if let Err(reason) = self.check(command) {
            tracing::debug!(action = %command.action, %reason, "command rejected");
            return Ok(Outcome::rejected(reason));
        }
        next.run(command).await
    }
}
