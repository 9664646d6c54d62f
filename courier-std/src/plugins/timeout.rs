//! Timeout plugin for time-limited execution.

use courier_core::{AsyncNext, AsyncPlugin, BoxError, Command, Message, Outcome};
use std::time::Duration;
use tokio::time::timeout;

/// A plugin bounding the rest of the chain by a deadline.
///
/// When the deadline passes first, the pending work is dropped and the
/// dispatch resolves as rejected with `timed out after <duration>`. Only
/// available for the async dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPlugin {
    duration: Duration,
}

impl TimeoutPlugin {
    /// Create a timeout plugin.
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The configured deadline.
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for TimeoutPlugin
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
        match timeout(self.duration, next.run(command)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    action = %command.action,
                    duration = ?self.duration,
                    "command timed out"
                );
                Ok(Outcome::rejected(format!("timed out after {:?}", self.duration)))
            }
        }
    }
}
