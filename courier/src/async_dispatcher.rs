//! The suspension-capable dispatcher.
//!
//! Handlers, plugins and hooks may each await. The dispatch follows the same
//! state machine as [`Dispatcher`](crate::Dispatcher): plugin "before" logic
//! in registration order, "after" logic in reverse, hooks in registration
//! order, each awaited before the next step starts. The returned future
//! resolves only after the last hook has finished.
//!
//! No parallelism is introduced within a dispatch; concurrent dispatches on
//! one dispatcher are independent flows that may interleave at await points.

use courier_core::{
    AsyncFnHandler, AsyncFnHook, AsyncFnPlugin, AsyncHandler, AsyncHook, AsyncNext, AsyncPlugin,
    BoxError, BoxFuture, Command, DiagnosticSink, DispatchError, DynAsyncHandler, DynAsyncHook,
    DynAsyncPlugin, HandlerRegistry, Message, OrderedList, Outcome, Subscription, TracingSink,
    notify_async,
};
use std::{fmt, sync::Arc};

/// An async command dispatcher.
///
/// # Example
///
/// ```rust,ignore
/// let bus: AsyncDispatcher<Item, (), u32> = AsyncDispatcher::new();
/// bus.register_fn("item.double", |cmd| {
///     Box::pin(async move {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         Ok(cmd.target.value * 2)
///     })
/// });
///
/// let outcome = bus.dispatch("item.double", Item { value: 5 }).await?;
/// assert_eq!(outcome.value(), Some(&10));
/// ```
pub struct AsyncDispatcher<T, P = (), V = ()> {
    handlers: Arc<HandlerRegistry<dyn DynAsyncHandler<T, P, V>>>,
    plugins: Arc<OrderedList<dyn DynAsyncPlugin<T, P, V>>>,
    hooks: Arc<OrderedList<dyn DynAsyncHook<T, P, V>>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<T, P, V> AsyncDispatcher<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    /// Create a dispatcher reporting hook failures through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }

    /// Create a dispatcher reporting hook failures to `sink`.
    pub fn with_sink(sink: impl DiagnosticSink) -> Self {
        Self {
            handlers: Arc::new(HandlerRegistry::new()),
            plugins: Arc::new(OrderedList::new()),
            hooks: Arc::new(OrderedList::new()),
            sink: Arc::new(sink),
        }
    }

    /// Start building a dispatcher.
    pub fn builder() -> AsyncDispatcherBuilder<T, P, V> {
        AsyncDispatcherBuilder::new()
    }

    /// Bind `handler` to `action`, replacing any previous binding.
    pub fn register<H>(&self, action: impl Into<String>, handler: H) -> Subscription
    where
        H: AsyncHandler<T, P, V>,
    {
        let action = action.into();
        let handler: Arc<dyn DynAsyncHandler<T, P, V>> = Arc::new(handler);
        let (token, replaced) = self.handlers.insert(action.clone(), handler);
        if replaced {
            tracing::debug!(%action, "replaced existing handler");
        }
        Subscription::new(&self.handlers, token)
    }

    /// Bind a closure returning a boxed future to `action`.
    pub fn register_fn<F>(&self, action: impl Into<String>, handler: F) -> Subscription
    where
        F: for<'a> Fn(&'a Command<T, P>) -> BoxFuture<'a, Result<V, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.register(action, AsyncFnHandler::new(handler))
    }

    /// Append a plugin to the chain.
    pub fn use_plugin<Pl>(&self, plugin: Pl) -> Subscription
    where
        Pl: AsyncPlugin<T, P, V>,
    {
        let plugin: Arc<dyn DynAsyncPlugin<T, P, V>> = Arc::new(plugin);
        let token = self.plugins.push(plugin);
        Subscription::new(&self.plugins, token)
    }

    /// Append a closure plugin to the chain.
    pub fn use_fn<F>(&self, plugin: F) -> Subscription
    where
        F: for<'a> Fn(
                &'a mut Command<T, P>,
                AsyncNext<'a, T, P, V>,
            ) -> BoxFuture<'a, Result<Outcome<V>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.use_plugin(AsyncFnPlugin::new(plugin))
    }

    /// Append an after-dispatch hook.
    pub fn on_after<K>(&self, hook: K) -> Subscription
    where
        K: AsyncHook<T, P, V>,
    {
        let hook: Arc<dyn DynAsyncHook<T, P, V>> = Arc::new(hook);
        let token = self.hooks.push(hook);
        Subscription::new(&self.hooks, token)
    }

    /// Append a closure hook.
    pub fn on_after_fn<F>(&self, hook: F) -> Subscription
    where
        F: for<'a> Fn(&'a Command<T, P>, &'a Outcome<V>) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_after(AsyncFnHook::new(hook))
    }

    /// Dispatch `action` against `target` without a payload.
    pub async fn dispatch(
        &self,
        action: impl Into<String>,
        target: T,
    ) -> Result<Outcome<V>, DispatchError> {
        self.dispatch_command(Command::new(action, target)).await
    }

    /// Dispatch `action` against `target` with a payload.
    pub async fn dispatch_with(
        &self,
        action: impl Into<String>,
        target: T,
        payload: P,
    ) -> Result<Outcome<V>, DispatchError> {
        self.dispatch_command(Command::new(action, target).with_payload(payload))
            .await
    }

    /// Dispatch a prepared command.
    pub async fn dispatch_command(
        &self,
        mut command: Command<T, P>,
    ) -> Result<Outcome<V>, DispatchError> {
        let action = command.action.clone();
        let handler = self.handlers.resolve(&action);
        if handler.is_none() {
            tracing::debug!(%action, "no handler registered");
        }

        let plugins = self.plugins.snapshot();
        let hooks = self.hooks.snapshot();
        tracing::trace!(%action, plugins = plugins.len(), "dispatching");
        let outcome = AsyncNext::new(&plugins, &action, handler.as_deref())
            .run(&mut command)
            .await?;

        notify_async(&hooks, &command, &outcome, self.sink.as_ref()).await;
        tracing::trace!(%action, ok = outcome.is_ok(), "dispatched");

        Ok(outcome)
    }

    /// Returns `true` if a handler is bound to `action`.
    pub fn has_handler(&self, action: &str) -> bool {
        self.handlers.contains(action)
    }

    /// Number of bound actions.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Remove every handler, plugin and hook.
    pub fn clear(&self) {
        self.handlers.clear();
        self.plugins.clear();
        self.hooks.clear();
    }
}

impl<T, P, V> Default for AsyncDispatcher<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, V> Clone for AsyncDispatcher<T, P, V> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            plugins: Arc::clone(&self.plugins),
            hooks: Arc::clone(&self.hooks),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<T, P, V> fmt::Debug for AsyncDispatcher<T, P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDispatcher")
            .field("handlers", &self.handlers.len())
            .field("plugins", &self.plugins.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Builder for constructing an [`AsyncDispatcher`].
pub struct AsyncDispatcherBuilder<T, P, V> {
    sink: Arc<dyn DiagnosticSink>,
    handlers: Vec<(String, Arc<dyn DynAsyncHandler<T, P, V>>)>,
    plugins: Vec<Arc<dyn DynAsyncPlugin<T, P, V>>>,
    hooks: Vec<Arc<dyn DynAsyncHook<T, P, V>>>,
}

impl<T, P, V> AsyncDispatcherBuilder<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            handlers: Vec::new(),
            plugins: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Report hook failures to `sink` instead of `tracing`.
    pub fn sink(mut self, sink: impl DiagnosticSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Bind a handler.
    pub fn handler(
        mut self,
        action: impl Into<String>,
        handler: impl AsyncHandler<T, P, V>,
    ) -> Self {
        let handler: Arc<dyn DynAsyncHandler<T, P, V>> = Arc::new(handler);
        self.handlers.push((action.into(), handler));
        self
    }

    /// Append a plugin.
    pub fn plugin(mut self, plugin: impl AsyncPlugin<T, P, V>) -> Self {
        let plugin: Arc<dyn DynAsyncPlugin<T, P, V>> = Arc::new(plugin);
        self.plugins.push(plugin);
        self
    }

    /// Append a hook.
    pub fn hook(mut self, hook: impl AsyncHook<T, P, V>) -> Self {
        let hook: Arc<dyn DynAsyncHook<T, P, V>> = Arc::new(hook);
        self.hooks.push(hook);
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> AsyncDispatcher<T, P, V> {
        let dispatcher = AsyncDispatcher {
            handlers: Arc::new(HandlerRegistry::new()),
            plugins: Arc::new(OrderedList::new()),
            hooks: Arc::new(OrderedList::new()),
            sink: self.sink,
        };
        for (action, handler) in self.handlers {
            dispatcher.handlers.insert(action, handler);
        }
        for plugin in self.plugins {
            dispatcher.plugins.push(plugin);
        }
        for hook in self.hooks {
            dispatcher.hooks.push(hook);
        }
        dispatcher
    }
}

impl<T, P, V> Default for AsyncDispatcherBuilder<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    fn default() -> Self {
        Self::new()
    }
}
