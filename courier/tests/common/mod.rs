#![allow(dead_code)]

use courier::{AsyncHandler, BoxError, Command, Handler, testing::MarkerLog};
use std::{sync::Once, time::Duration};

// ============================================================================
// Tracing
// ============================================================================

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` filters it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Test Command Types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub value: u32,
}

pub fn item(value: u32) -> Item {
    Item { value }
}

// ============================================================================
// Test Handlers
// ============================================================================

/// Doubles `target.value`.
pub struct Doubler;

impl Handler<Item, (), u32> for Doubler {
    fn handle(&self, command: &Command<Item>) -> Result<u32, BoxError> {
        Ok(command.target.value * 2)
    }
}

/// Doubles `target.value` after suspending for `delay`.
pub struct SlowDoubler {
    pub delay: Duration,
}

impl AsyncHandler<Item, (), u32> for SlowDoubler {
    async fn handle(&self, command: &Command<Item>) -> Result<u32, BoxError> {
        tokio::time::sleep(self.delay).await;
        Ok(command.target.value * 2)
    }
}

/// Pushes `"handler"` to a marker log and echoes `target.value`.
pub struct MarkingHandler {
    pub log: MarkerLog,
}

impl Handler<Item, (), u32> for MarkingHandler {
    fn handle(&self, command: &Command<Item>) -> Result<u32, BoxError> {
        self.log.lock().push("handler".to_string());
        Ok(command.target.value)
    }
}

impl AsyncHandler<Item, (), u32> for MarkingHandler {
    async fn handle(&self, command: &Command<Item>) -> Result<u32, BoxError> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.log.lock().push("handler".to_string());
        Ok(command.target.value)
    }
}

pub fn markers(log: &MarkerLog) -> Vec<String> {
    log.lock().clone()
}
