use courier::{
    AsyncDispatcher, AsyncNext, AsyncPlugin, BoxError, Command, CommandError, DispatchError,
    Outcome,
    testing::{
        CollectingSink, CountingHandler, FailingHook, MarkerLog, MarkerPlugin, RecordingHook,
        marker_log,
    },
};
use std::{sync::Arc, time::Duration};

mod common;
use common::{Item, MarkingHandler, SlowDoubler, init_tracing, item, markers};

fn bus() -> AsyncDispatcher<Item, (), u32> {
    init_tracing();
    AsyncDispatcher::new()
}

/// Marks before and after the rest of the chain, suspending on both sides.
struct DelayedMarker {
    name: &'static str,
    delay: Duration,
    log: MarkerLog,
}

impl AsyncPlugin<Item, (), u32> for DelayedMarker {
    async fn handle(
        &self,
        command: &mut Command<Item>,
        next: AsyncNext<'_, Item, (), u32>,
    ) -> Result<Outcome<u32>, BoxError> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().push(format!("{}-before", self.name));
        let outcome = next.run(command).await?;
        tokio::time::sleep(self.delay).await;
        self.log.lock().push(format!("{}-after", self.name));
        Ok(outcome)
    }
}

#[tokio::test]
async fn test_suspending_handler_resolves_with_value() {
    let bus = bus();
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(10),
        },
    );

    let outcome = bus.dispatch("test.action", item(5)).await.unwrap();
    assert_eq!(outcome.value(), Some(&10));
}

#[tokio::test]
async fn test_closure_handler() {
    let bus = bus();
    bus.register_fn("test.action", |cmd| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(cmd.target.value + 1)
        })
    });

    assert_eq!(bus.dispatch("test.action", item(1)).await.unwrap().value(), Some(&2));
}

#[tokio::test]
async fn test_failures_match_blocking_shape() {
    let bus = bus();
    bus.register_fn("test.fail", |_| Box::pin(async { Err("disk full".into()) }));
    bus.register_fn("test.panic", |cmd| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            if cmd.target.value == 0 {
                panic!("lost connection");
            }
            Ok(cmd.target.value)
        })
    });

    let missing = bus.dispatch("unknown.action", item(0)).await.unwrap();
    assert!(missing.error().unwrap().to_string().contains("unknown.action"));

    let failed = bus.dispatch("test.fail", item(0)).await.unwrap();
    assert_eq!(failed.error().map(ToString::to_string).as_deref(), Some("disk full"));

    let panicked = bus.dispatch("test.panic", item(0)).await.unwrap();
    assert!(matches!(
        panicked.error(),
        Some(CommandError::Panicked(msg)) if msg == "lost connection"
    ));
}

#[tokio::test]
async fn test_order_holds_under_suspension() {
    let bus = bus();
    let log = marker_log();
    // The outer plugin waits longer, which must not let the inner one run first.
    bus.use_plugin(DelayedMarker {
        name: "P1",
        delay: Duration::from_millis(6),
        log: log.clone(),
    });
    bus.use_plugin(DelayedMarker {
        name: "P2",
        delay: Duration::from_millis(1),
        log: log.clone(),
    });
    bus.register("test.action", MarkingHandler { log: log.clone() });
    let hook_log = log.clone();
    bus.on_after_fn(move |_, _| {
        let hook_log = hook_log.clone();
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(3)).await;
            hook_log.lock().push("hook".to_string());
            Ok(())
        })
    });

    let outcome = bus.dispatch("test.action", item(8)).await.unwrap();

    assert_eq!(outcome.value(), Some(&8));
    assert_eq!(
        markers(&log),
        vec!["P1-before", "P2-before", "handler", "P2-after", "P1-after", "hook"]
    );
}

#[tokio::test]
async fn test_short_circuit_and_marker_plugins() {
    let bus = bus();
    let log = marker_log();
    let handler = CountingHandler::new(0_u32);
    bus.register("test.action", handler.clone());
    bus.use_plugin(MarkerPlugin::new("P1", &log));
    bus.use_fn(|_, _| Box::pin(async { Ok(Outcome::rejected("Blocked")) }));
    bus.use_plugin(MarkerPlugin::new("P3", &log));

    let outcome = bus.dispatch("test.action", item(1)).await.unwrap();

    assert_eq!(outcome.error().map(ToString::to_string).as_deref(), Some("Blocked"));
    assert_eq!(handler.calls(), 0);
    assert_eq!(markers(&log), vec!["P1-before", "P1-after"]);
}

#[tokio::test]
async fn test_hooks_are_contained_and_awaited_before_return() {
    init_tracing();
    let sink = CollectingSink::new();
    let bus: AsyncDispatcher<Item, (), u32> = AsyncDispatcher::with_sink(sink.clone());
    let recorder = RecordingHook::new();
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(1),
        },
    );
    bus.on_after(FailingHook::error("metrics down"));
    bus.on_after(FailingHook::panic("metrics on fire"));
    bus.on_after(recorder.clone());

    let outcome = bus.dispatch("test.action", item(3)).await.unwrap();

    assert_eq!(outcome.value(), Some(&6));
    assert_eq!(recorder.count(), 1);
    assert_eq!(sink.reports().len(), 2);
}

#[tokio::test]
async fn test_plugin_body_failure_escapes_dispatch() {
    let bus = bus();
    bus.use_fn(|cmd, next| {
        Box::pin(async move {
            let _ = next.run(cmd).await?;
            Err::<Outcome<u32>, BoxError>("post-processing bug".into())
        })
    });

    let err = bus.dispatch("anything", item(0)).await.unwrap_err();
    assert!(matches!(err, DispatchError::Plugin(_)));
}

#[tokio::test]
async fn test_concurrent_dispatches_are_independent() {
    let bus = bus();
    bus.register_fn("item.echo", |cmd| {
        Box::pin(async move {
            // Larger values finish first.
            tokio::time::sleep(Duration::from_millis(u64::from(20 - cmd.target.value))).await;
            Ok(cmd.target.value)
        })
    });
    let recorder = RecordingHook::new();
    bus.on_after(recorder.clone());

    let (a, b, c) = tokio::join!(
        bus.dispatch("item.echo", item(1)),
        bus.dispatch("item.echo", item(10)),
        bus.dispatch("item.echo", item(19)),
    );

    assert_eq!(a.unwrap().value(), Some(&1));
    assert_eq!(b.unwrap().value(), Some(&10));
    assert_eq!(c.unwrap().value(), Some(&19));
    assert_eq!(recorder.count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatcher_shared_across_tasks() {
    let bus = Arc::new(bus());
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(2),
        },
    );

    let tasks: Vec<_> = (1..=4)
        .map(|value| {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move { bus.dispatch("test.action", item(value)).await })
        })
        .collect();

    let mut values = Vec::new();
    for task in futures::future::join_all(tasks).await {
        values.push(task.unwrap().unwrap().into_value().unwrap());
    }
    assert_eq!(values, vec![2, 4, 6, 8]);
}

#[tokio::test]
async fn test_unsubscribe_async_registrations() {
    let bus = bus();
    let log = marker_log();
    let p1 = bus.use_plugin(MarkerPlugin::new("P1", &log));
    bus.use_plugin(MarkerPlugin::new("P2", &log));
    let handler_sub = bus.register("test.action", CountingHandler::new(1_u32));

    p1.unsubscribe();
    handler_sub.unsubscribe();
    let outcome = bus.dispatch("test.action", item(0)).await.unwrap();

    assert!(outcome.error().is_some_and(CommandError::is_no_handler));
    assert_eq!(markers(&log), vec!["P2-before", "P2-after"]);
}

#[tokio::test]
async fn test_hook_registered_during_dispatch_waits_for_next_dispatch() {
    let bus = bus();
    let late = RecordingHook::new();
    let registrar = bus.clone();
    let late_hook = late.clone();
    bus.use_fn(move |cmd, next| {
        registrar.on_after(late_hook.clone());
        next.run(cmd)
    });
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(1),
        },
    );

    let _ = bus.dispatch("test.action", item(1)).await.unwrap();
    assert_eq!(late.count(), 0);

    let _ = bus.dispatch("test.action", item(1)).await.unwrap();
    assert_eq!(late.count(), 1);
}

#[tokio::test]
async fn test_hook_unsubscribed_during_dispatch_still_sees_it() {
    let bus = bus();
    let early = RecordingHook::new();
    let sub = bus.on_after(early.clone());
    bus.use_fn(move |cmd, next| {
        sub.unsubscribe();
        next.run(cmd)
    });
    bus.register(
        "test.action",
        SlowDoubler {
            delay: Duration::from_millis(1),
        },
    );

    let _ = bus.dispatch("test.action", item(1)).await.unwrap();
    assert_eq!(early.count(), 1);

    let _ = bus.dispatch("test.action", item(1)).await.unwrap();
    assert_eq!(early.count(), 1);
    assert_eq!(bus.hook_count(), 0);
}
