//! Undo/redo tracking of dispatched commands.
//!
//! [`History`] is an after-dispatch hook. Each successful command whose action
//! matches the configured prefix is cloned onto an undo stack. Undo and redo
//! only move entries between stacks and hand them back; applying the inverse
//! operation is up to the caller, typically by dispatching another command.
//!
//! ```rust,ignore
//! let history = History::new();
//! dispatcher.on_after(history.clone());
//!
//! dispatcher.dispatch("doc.insert", edit)?;
//! if let Some(last) = history.undo() {
//!     dispatcher.dispatch("doc.revert", last.target)?;
//! }
//! ```

use courier_core::{AsyncHook, BoxError, Command, Hook, Message, Outcome};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Configuration for a [`History`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undo entries kept; the oldest entry is dropped first.
    pub limit: usize,
    /// Record only actions in this namespace (`"doc"` matches `"doc.insert"`).
    pub prefix: Option<String>,
}

impl HistoryConfig {
    /// Keep at most `limit` entries.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Record only actions in `namespace`.
    pub fn with_prefix(mut self, namespace: impl Into<String>) -> Self {
        self.prefix = Some(namespace.into());
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            prefix: None,
        }
    }
}

struct Stacks<T, P> {
    undo: VecDeque<Command<T, P>>,
    redo: Vec<Command<T, P>>,
}

struct Shared<T, P> {
    config: HistoryConfig,
    recording: AtomicBool,
    stacks: Mutex<Stacks<T, P>>,
}

/// A hook recording successful commands for undo and redo.
///
/// Clones share the same stacks, so keep one clone and register another.
pub struct History<T, P = ()> {
    shared: Arc<Shared<T, P>>,
}

impl<T, P> History<T, P> {
    /// Create a history with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create a history with the given configuration.
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                recording: AtomicBool::new(true),
                stacks: Mutex::new(Stacks {
                    undo: VecDeque::new(),
                    redo: Vec::new(),
                }),
            }),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &HistoryConfig {
        &self.shared.config
    }

    /// Returns `true` if [`undo`](Self::undo) would return an entry.
    pub fn can_undo(&self) -> bool {
        !self.shared.stacks.lock().undo.is_empty()
    }

    /// Returns `true` if [`redo`](Self::redo) would return an entry.
    pub fn can_redo(&self) -> bool {
        !self.shared.stacks.lock().redo.is_empty()
    }

    /// Number of undo entries.
    pub fn len(&self) -> usize {
        self.shared.stacks.lock().undo.len()
    }

    /// Returns `true` if nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry from both stacks.
    pub fn clear(&self) {
        let mut stacks = self.shared.stacks.lock();
        stacks.undo.clear();
        stacks.redo.clear();
    }

    /// Stop recording until [`resume`](Self::resume) is called.
    ///
    /// Useful while dispatching the inverse of an undone command.
    pub fn pause(&self) {
        self.shared.recording.store(false, Ordering::Release);
    }

    /// Resume recording.
    pub fn resume(&self) {
        self.shared.recording.store(true, Ordering::Release);
    }

    /// Returns `true` unless recording is paused.
    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::Acquire)
    }

    /// Push a command onto the undo stack, clearing the redo stack.
    ///
    /// Ignores commands outside the configured prefix and any command while
    /// recording is paused.
    pub fn record(&self, command: Command<T, P>) {
        if !self.accepts(&command) {
            return;
        }
        let mut stacks = self.shared.stacks.lock();
        stacks.undo.push_back(command);
        while stacks.undo.len() > self.shared.config.limit {
            stacks.undo.pop_front();
        }
        stacks.redo.clear();
    }

    fn accepts(&self, command: &Command<T, P>) -> bool {
        self.is_recording()
            && self
                .shared
                .config
                .prefix
                .as_deref()
                .is_none_or(|prefix| command.in_namespace(prefix))
    }
}

impl<T: Clone, P: Clone> History<T, P> {
    /// Move the newest entry onto the redo stack and return it.
    pub fn undo(&self) -> Option<Command<T, P>> {
        let mut stacks = self.shared.stacks.lock();
        let command = stacks.undo.pop_back()?;
        stacks.redo.push(command.clone());
        Some(command)
    }

    /// Move the newest undone entry back onto the undo stack and return it.
    pub fn redo(&self) -> Option<Command<T, P>> {
        let mut stacks = self.shared.stacks.lock();
        let command = stacks.redo.pop()?;
        stacks.undo.push_back(command.clone());
        Some(command)
    }

    /// The undo entries, oldest first.
    pub fn entries(&self) -> Vec<Command<T, P>> {
        self.shared.stacks.lock().undo.iter().cloned().collect()
    }
}

impl<T, P> Default for History<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> Clone for History<T, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, P> fmt::Debug for History<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stacks = self.shared.stacks.lock();
        f.debug_struct("History")
            .field("config", &self.shared.config)
            .field("undo", &stacks.undo.len())
            .field("redo", &stacks.redo.len())
            .finish()
    }
}

impl<T, P, V> Hook<T, P, V> for History<T, P>
where
    T: Message + Clone,
    P: Message + Clone,
    V: Message,
{
    fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError> {
        if outcome.is_ok() {
            self.record(command.clone());
        }
        Ok(())
    }
}

impl<T, P, V> AsyncHook<T, P, V> for History<T, P>
where
    T: Message + Clone,
    P: Message + Clone,
    V: Message,
{
    async fn after(&self, command: &Command<T, P>, outcome: &Outcome<V>) -> Result<(), BoxError> {
        if outcome.is_ok() {
            self.record(command.clone());
        }
        Ok(())
    }
}
