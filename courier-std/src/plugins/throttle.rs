//! Rate limiting per action.

use courier_core::{
    AsyncNext, AsyncPlugin, BoxError, Command, Message, Next, Outcome, Plugin,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// A plugin enforcing a minimum interval between dispatches of one action.
///
/// The first dispatch of an action always passes. A later dispatch of the
/// same action arriving before `interval` has elapsed since the last one
/// that passed is rejected with `throttled: <action>`. Different actions are
/// tracked independently.
#[derive(Debug)]
pub struct ThrottlePlugin {
    interval: Duration,
    last_passed: Mutex<HashMap<String, Instant>>,
}

impl ThrottlePlugin {
    /// Create a throttle with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_passed: Mutex::new(HashMap::new()),
        }
    }

    /// The configured interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Forget every recorded dispatch.
    pub fn reset(&self) {
        self.last_passed.lock().clear();
    }

    fn admit(&self, action: &str) -> bool {
        let now = Instant::now();
        let mut last_passed = self.last_passed.lock();
        match last_passed.get(action) {
            Some(at) if now.duration_since(*at) < self.interval => false,
            _ => {
                last_passed.insert(action.to_string(), now);
                true
            }
        }
    }
}

impl<T, P, V> Plugin<T, P, V> for ThrottlePlugin
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
        if !self.admit(&command.action) {
            tracing::debug!(action = %command.action, "command throttled");
            return Ok(Outcome::rejected(format!("throttled: {}", command.action)));
        }
        next.run(command)
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for ThrottlePlugin
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
        if !self.admit(&command.action) {
            tracing::debug!(action = %command.action, "command throttled");
            return Ok(Outcome::rejected(format!("throttled: {}", command.action)));
        }
        next.run(command).await
    }
}
