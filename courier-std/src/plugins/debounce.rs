//! Debouncing bursts of the same action.

use courier_core::{AsyncNext, AsyncPlugin, BoxError, Command, Message, Outcome};
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};

/// A plugin that lets only the last dispatch of a burst reach the handler.
///
/// Each dispatch waits `delay` before continuing. If another dispatch of the
/// same action started during that wait, the earlier one resolves as
/// rejected with `debounced: <action>` and never runs the rest of the chain.
/// Only available for the async dispatcher.
#[derive(Debug)]
pub struct DebouncePlugin {
    delay: Duration,
    generations: Mutex<HashMap<String, u64>>,
}

impl DebouncePlugin {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// The configured quiet period.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn begin(&self, action: &str) -> u64 {
        let mut generations = self.generations.lock();
        let generation = generations.entry(action.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_latest(&self, action: &str, generation: u64) -> bool {
        self.generations.lock().get(action) == Some(&generation)
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for DebouncePlugin
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
        let generation = self.begin(&command.action);
        tokio::time::sleep(self.delay).await;

        if !self.is_latest(&command.action, generation) {
            tracing::debug!(action = %command.action, "command debounced");
            return Ok(Outcome::rejected(format!("debounced: {}", command.action)));
        }
        next.run(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_are_per_action() {
        let debounce = DebouncePlugin::new(Duration::from_millis(5));
        let first = debounce.begin("search");
        let other = debounce.begin("save");
        let second = debounce.begin("search");

        assert!(!debounce.is_latest("search", first));
        assert!(debounce.is_latest("search", second));
        assert!(debounce.is_latest("save", other));
    }
}
