use courier::{
    AsyncDispatcher, CommandError, Dispatcher,
    history::{History, HistoryConfig},
    plugins::{
        DebouncePlugin, LoggingPlugin, RetryPlugin, RetryPolicy, ThrottlePlugin, TimeoutPlugin,
        ValidationPlugin,
    },
    state::CommandState,
    testing::CountingHandler,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

mod common;
use common::{Doubler, Item, SlowDoubler, init_tracing, item};

fn positive_values() -> ValidationPlugin<Item> {
    ValidationPlugin::<Item>::new().rule("test.action", |cmd| {
        if cmd.target.value > 0 {
            Ok(())
        } else {
            Err("value must be positive".to_string())
        }
    })
}

#[test]
fn test_logging_and_validation_stack() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    bus.use_plugin(LoggingPlugin::new());
    bus.use_plugin(positive_values());
    bus.register("test.action", Doubler);

    let rejected = bus.dispatch("test.action", item(0)).unwrap();
    assert!(matches!(
        rejected.error(),
        Some(CommandError::Rejected(msg)) if msg == "value must be positive"
    ));
    assert_eq!(bus.dispatch("test.action", item(4)).unwrap().value(), Some(&8));
}

#[test]
fn test_retry_reenters_rest_of_chain() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    let attempts = Arc::new(AtomicU32::new(0));
    let passes = Arc::new(AtomicU32::new(0));

    bus.use_plugin(RetryPlugin::new(RetryPolicy::attempts(3)));
    let passes_clone = passes.clone();
    bus.use_fn(move |cmd, next| {
        passes_clone.fetch_add(1, Ordering::SeqCst);
        next.run(cmd)
    });
    let attempts_clone = attempts.clone();
    bus.register_fn("flaky", move |cmd| {
        if attempts_clone.fetch_add(1, Ordering::SeqCst) < 2 {
            return Err("try again".into());
        }
        Ok(cmd.target.value)
    });

    assert_eq!(bus.dispatch("flaky", item(7)).unwrap().value(), Some(&7));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(passes.load(Ordering::SeqCst), 3);
}

#[test]
fn test_retry_does_not_retry_rejections() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    let handler = CountingHandler::new(1_u32);
    bus.use_plugin(RetryPlugin::default());
    bus.use_plugin(positive_values());
    bus.register("test.action", handler.clone());

    assert!(bus.dispatch("test.action", item(0)).unwrap().is_err());
    assert_eq!(handler.calls(), 0);
}

#[test]
fn test_throttle_rejects_rapid_repeats() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    bus.use_plugin(ThrottlePlugin::new(Duration::from_secs(60)));
    bus.register("test.action", Doubler);

    assert!(bus.dispatch("test.action", item(1)).unwrap().is_ok());
    let second = bus.dispatch("test.action", item(1)).unwrap();
    assert_eq!(
        second.error().map(ToString::to_string).as_deref(),
        Some("throttled: test.action")
    );
}

#[test]
fn test_history_records_successes_only() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    let history = History::with_config(HistoryConfig::default().with_prefix("test"));
    bus.on_after(history.clone());
    bus.register("test.action", Doubler);

    let _ = bus.dispatch("test.action", item(1)).unwrap();
    let _ = bus.dispatch("test.action", item(2)).unwrap();
    let _ = bus.dispatch("test.missing", item(3)).unwrap();

    assert_eq!(history.len(), 2);
    let undone = history.undo().unwrap();
    assert_eq!(undone.target, item(2));
    assert!(history.can_redo());

    // Re-applying the undone command through the bus records it again and
    // invalidates the redo stack.
    let _ = bus.dispatch_command(undone).unwrap();
    assert!(!history.can_redo());
    assert_eq!(history.len(), 2);
}

#[test]
fn test_command_state_tracks_dispatch() {
    init_tracing();
    let bus: Dispatcher<Item, (), u32> = Dispatcher::new();
    bus.register("test.action", Doubler);
    let state = CommandState::new();

    let _ = state.track(|| bus.dispatch("test.action", item(6))).unwrap();
    assert_eq!(state.value(), Some(12));
    assert!(!state.loading());

    let _ = state.track(|| bus.dispatch("missing", item(6))).unwrap();
    assert_eq!(state.error().as_deref(), Some("no handler for missing"));
    assert_eq!(state.value(), Some(12));
}

#[tokio::test]
async fn test_debounce_lets_only_last_call_through() {
    init_tracing();
    let bus: AsyncDispatcher<Item, (), u32> = AsyncDispatcher::new();
    let handler = CountingHandler::new(0_u32);
    bus.use_plugin(DebouncePlugin::new(Duration::from_millis(20)));
    bus.register("search", handler.clone());

    let (first, second, third) = tokio::join!(
        bus.dispatch("search", item(1)),
        bus.dispatch("search", item(2)),
        bus.dispatch("search", item(3)),
    );

    for outcome in [first.unwrap(), second.unwrap()] {
        assert_eq!(
            outcome.error().map(ToString::to_string).as_deref(),
            Some("debounced: search")
        );
    }
    assert!(third.unwrap().is_ok());
    assert_eq!(handler.calls(), 1);
}

#[tokio::test]
async fn test_timeout_rejects_slow_handler() {
    init_tracing();
    let bus: AsyncDispatcher<Item, (), u32> = AsyncDispatcher::new();
    bus.use_plugin(TimeoutPlugin::new(Duration::from_millis(10)));
    bus.register(
        "slow",
        SlowDoubler {
            delay: Duration::from_secs(2),
        },
    );
    bus.register(
        "fast",
        SlowDoubler {
            delay: Duration::from_millis(1),
        },
    );

    let slow = bus.dispatch("slow", item(1)).await.unwrap();
    assert!(slow.error().is_some_and(CommandError::is_rejected));
    assert_eq!(bus.dispatch("fast", item(1)).await.unwrap().value(), Some(&2));
}

#[tokio::test]
async fn test_async_stack_with_history_and_state() {
    init_tracing();
    let bus: AsyncDispatcher<Item, (), u32> = AsyncDispatcher::new();
    let history: History<Item> = History::new();
    bus.use_plugin(LoggingPlugin::labeled("async"));
    bus.use_plugin(RetryPlugin::new(
        RetryPolicy::attempts(2).with_backoff(Duration::from_millis(1)),
    ));
    bus.on_after(history.clone());
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(1),
        },
    );
    let state = CommandState::new();

    let outcome = state
        .track_async(bus.dispatch("test.action", item(5)))
        .await
        .unwrap();

    assert_eq!(outcome.value(), Some(&10));
    assert_eq!(state.value(), Some(10));
    assert_eq!(history.entries().len(), 1);
}
