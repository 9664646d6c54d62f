//! The blocking dispatcher.
//!
//! Every step of a dispatch runs to completion on the caller's thread before
//! the next one starts; `dispatch` returns a finished [`Outcome`].

use courier_core::{
    BoxError, Command, DiagnosticSink, DispatchError, FnHandler, FnHook, FnPlugin, Handler,
    HandlerRegistry, Hook, Message, Next, OrderedList, Outcome, Plugin, Subscription, TracingSink,
    notify,
};
use std::{fmt, sync::Arc};

/// A blocking command dispatcher.
///
/// Owns a handler registry, a plugin chain and a hook list. Cloning a
/// `Dispatcher` yields another handle to the same registrations; separately
/// constructed dispatchers share nothing.
///
/// # Example
///
/// ```rust
/// use courier::Dispatcher;
///
/// let bus: Dispatcher<i32, (), i32> = Dispatcher::new();
/// bus.register_fn("number.double", |cmd| Ok(cmd.target * 2));
///
/// let outcome = bus.dispatch("number.double", 5).unwrap();
/// assert_eq!(outcome.value(), Some(&10));
/// ```
pub struct Dispatcher<T, P = (), V = ()> {
    handlers: Arc<HandlerRegistry<dyn Handler<T, P, V>>>,
    plugins: Arc<OrderedList<dyn Plugin<T, P, V>>>,
    hooks: Arc<OrderedList<dyn Hook<T, P, V>>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<T, P, V> Dispatcher<T, P, V>
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
    pub fn builder() -> DispatcherBuilder<T, P, V> {
        DispatcherBuilder::new()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Bind `handler` to `action`, replacing any previous binding.
    ///
    /// The returned subscription removes this binding only; once the action
    /// has been rebound, unsubscribing an older registration does nothing.
    pub fn register<H>(&self, action: impl Into<String>, handler: H) -> Subscription
    where
        H: Handler<T, P, V>,
    {
        let action = action.into();
        let (token, replaced) = self.handlers.insert(action.clone(), Arc::new(handler));
        if replaced {
            tracing::debug!(%action, "replaced existing handler");
        }
        Subscription::new(&self.handlers, token)
    }

    /// Bind a closure to `action`.
    pub fn register_fn<F>(&self, action: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Command<T, P>) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.register(action, FnHandler::new(handler))
    }

    /// Append a plugin to the chain.
    ///
    /// Plugins run in registration order; the first one registered is the
    /// outermost.
    pub fn use_plugin<Pl>(&self, plugin: Pl) -> Subscription
    where
        Pl: Plugin<T, P, V>,
    {
        let token = self.plugins.push(Arc::new(plugin));
        Subscription::new(&self.plugins, token)
    }

    /// Append a closure plugin to the chain.
    pub fn use_fn<F>(&self, plugin: F) -> Subscription
    where
        F: Fn(&mut Command<T, P>, Next<'_, T, P, V>) -> Result<Outcome<V>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.use_plugin(FnPlugin::new(plugin))
    }

    /// Append an after-dispatch hook.
    pub fn on_after<K>(&self, hook: K) -> Subscription
    where
        K: Hook<T, P, V>,
    {
        let token = self.hooks.push(Arc::new(hook));
        Subscription::new(&self.hooks, token)
    }

    /// Append a closure hook.
    pub fn on_after_fn<F>(&self, hook: F) -> Subscription
    where
        F: Fn(&Command<T, P>, &Outcome<V>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_after(FnHook::new(hook))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Dispatch `action` against `target` without a payload.
    pub fn dispatch(
        &self,
        action: impl Into<String>,
        target: T,
    ) -> Result<Outcome<V>, DispatchError> {
        self.dispatch_command(Command::new(action, target))
    }

    /// Dispatch `action` against `target` with a payload.
    pub fn dispatch_with(
        &self,
        action: impl Into<String>,
        target: T,
        payload: P,
    ) -> Result<Outcome<V>, DispatchError> {
        self.dispatch_command(Command::new(action, target).with_payload(payload))
    }

    /// Dispatch a prepared command.
    ///
    /// Returns `Err` only when a plugin body fails; every other failure is a
    /// failing [`Outcome`].
    pub fn dispatch_command(
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
        let outcome = Next::new(&plugins, &action, handler.as_deref()).run(&mut command)?;

        notify(&hooks, &command, &outcome, self.sink.as_ref());
        tracing::trace!(%action, ok = outcome.is_ok(), "dispatched");

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

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

impl<T, P, V> Default for Dispatcher<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, V> Clone for Dispatcher<T, P, V> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            plugins: Arc::clone(&self.plugins),
            hooks: Arc::clone(&self.hooks),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<T, P, V> fmt::Debug for Dispatcher<T, P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .field("plugins", &self.plugins.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Builder for constructing a [`Dispatcher`].
///
/// # Example
/// ```ignore
/// let bus = Dispatcher::builder()
///     .sink(|err: &HookError| eprintln!("{err}"))
///     .plugin(LoggingPlugin::new())
///     .handler("cart.add", AddToCart)
///     .build();
/// ```
pub struct DispatcherBuilder<T, P, V> {
    sink: Arc<dyn DiagnosticSink>,
    handlers: Vec<(String, Arc<dyn Handler<T, P, V>>)>,
    plugins: Vec<Arc<dyn Plugin<T, P, V>>>,
    hooks: Vec<Arc<dyn Hook<T, P, V>>>,
}

impl<T, P, V> DispatcherBuilder<T, P, V>
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
    pub fn handler(mut self, action: impl Into<String>, handler: impl Handler<T, P, V>) -> Self {
        let handler: Arc<dyn Handler<T, P, V>> = Arc::new(handler);
        self.handlers.push((action.into(), handler));
        self
    }

    /// Append a plugin.
    pub fn plugin(mut self, plugin: impl Plugin<T, P, V>) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Append a hook.
    pub fn hook(mut self, hook: impl Hook<T, P, V>) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Dispatcher<T, P, V> {
        let dispatcher = Dispatcher {
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

impl<T, P, V> Default for DispatcherBuilder<T, P, V>
where
    T: Message,
    P: Message,
    V: Message,
{
    fn default() -> Self {
        Self::new()
    }
}
