//! Retry plugin for transient handler failures.

use courier_core::{
    AsyncNext, AsyncPlugin, BoxError, Command, CommandError, Message, Next, Outcome, Plugin,
};
use std::time::Duration;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry up to `max_attempts` times in total, without pausing.
    pub const fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    /// Pause for `backoff` between attempts.
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::attempts(3)
    }
}

/// A plugin that re-runs the rest of the chain while the handler fails.
///
/// Only handler errors and panics are retried. A missing handler or a
/// rejection by a later plugin is returned at once, and a plugin body
/// failure propagates unchanged. Every attempt re-enters every plugin
/// registered after this one.
///
/// The blocking variant sleeps the calling thread between attempts. The async
/// variant waits on the tokio timer and ignores `backoff` when the `time`
/// feature is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPlugin {
    policy: RetryPolicy,
}

impl RetryPlugin {
    /// Create a retry plugin.
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn should_retry<V>(&self, outcome: &Outcome<V>, attempt: u32) -> bool {
        attempt < self.policy.max_attempts
            && outcome.error().is_some_and(CommandError::is_handler_failure)
    }
}

impl<T, P, V> Plugin<T, P, V> for RetryPlugin
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
        let mut attempt = 1;
        loop {
            let outcome = next.run(command)?;
            if !self.should_retry(&outcome, attempt) {
                return Ok(outcome);
            }
            tracing::debug!(action = %command.action, attempt, "retrying failed command");
            if !self.policy.backoff.is_zero() {
                std::thread::sleep(self.policy.backoff);
            }
            attempt += 1;
        }
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for RetryPlugin
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
        let mut attempt = 1;
        loop {
            let outcome = next.run(command).await?;
            if !self.should_retry(&outcome, attempt) {
                return Ok(outcome);
            }
            tracing::debug!(action = %command.action, attempt, "retrying failed command");
            #[cfg(feature = "time")]
            {
                if !self.policy.backoff.is_zero() {
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
            attempt += 1;
        }
    }
}
