//! Logging plugin for command observation.

use courier_core::{
    AsyncNext, AsyncPlugin, BoxError, Command, Message, Next, Outcome, Plugin,
};
use std::{fmt::Debug, time::Instant};
use tracing::Instrument;

/// A plugin that logs every command and its outcome.
///
/// Register it first to observe the command exactly as the caller sent it
/// and the outcome exactly as the caller receives it. It never alters
/// either.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPlugin {
    label: &'static str,
}

impl LoggingPlugin {
    /// Create a logging plugin.
    pub const fn new() -> Self {
        Self { label: "courier" }
    }

    /// Create a logging plugin whose span carries `label`, to tell several
    /// dispatchers apart in the logs.
    pub const fn labeled(label: &'static str) -> Self {
        Self { label }
    }
}

fn log_outcome<V>(outcome: &Outcome<V>, started: Instant) {
    let elapsed_us = started.elapsed().as_micros();
    match outcome.error() {
        None => tracing::debug!(elapsed_us, "command succeeded"),
        Some(err) => tracing::warn!(elapsed_us, error = %err, "command failed"),
    }
}

impl<T, P, V> Plugin<T, P, V> for LoggingPlugin
where
    T: Message + Debug,
    P: Message + Debug,
    V: Message,
{
    fn handle(
        &self,
        command: &mut Command<T, P>,
        next: Next<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        let span = tracing::info_span!("command", label = self.label, action = %command.action);
        let _entered = span.enter();

        tracing::info!(cmd_target = ?command.target, cmd_payload = ?command.payload, "dispatching");
        let started = Instant::now();
        let outcome = next.run(command)?;
        log_outcome(&outcome, started);
        Ok(outcome)
    }
}

impl<T, P, V> AsyncPlugin<T, P, V> for LoggingPlugin
where
    T: Message + Debug,
    P: Message + Debug,
    V: Message,
{
    async fn handle(
        &self,
        command: &mut Command<T, P>,
        next: AsyncNext<'_, T, P, V>,
    ) -> Result<Outcome<V>, BoxError> {
        let span = tracing::info_span!("command", label = self.label, action = %command.action);

        async move {
            tracing::info!(cmd_target = ?command.target, cmd_payload = ?command.payload, "dispatching");
            let started = Instant::now();
            let outcome = next.run(command).await?;
            log_outcome(&outcome, started);
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
