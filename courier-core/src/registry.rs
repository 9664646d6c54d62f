//! Storage for handlers, plugins and hooks.
//!
//! - [`HandlerRegistry`] maps action names to exactly one handler.
//! - [`OrderedList`] keeps plugins or hooks in registration order.
//!
//! Both are generic over the stored trait object so the blocking and the
//! async dispatcher share them.

use crate::subscription::{Detach, Token};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// A registered item together with its registration token.
pub struct Registered<E: ?Sized> {
    token: Token,
    inner: Arc<E>,
}

impl<E: ?Sized> Registered<E> {
    /// The registration token.
    pub fn token(&self) -> Token {
        self.token
    }

    /// The registered item.
    pub fn get(&self) -> &E {
        &self.inner
    }
}

impl<E: ?Sized> Clone for Registered<E> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Mapping from action name to a single handler.
///
/// Registration is last-write-wins: binding an action that already has a
/// handler silently replaces it. Removal is by registration token, so a stale
/// subscription cannot unbind a newer handler for the same action.
pub struct HandlerRegistry<H: ?Sized> {
    handlers: RwLock<HashMap<String, Registered<H>>>,
}

impl<H: ?Sized> HandlerRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `handler` to `action`.
    ///
    /// Returns the new registration token and whether a previous binding was
    /// replaced.
    pub fn insert(&self, action: impl Into<String>, handler: Arc<H>) -> (Token, bool) {
        let token = Token::next();
        let previous = self.handlers.write().insert(
            action.into(),
            Registered {
                token,
                inner: handler,
            },
        );
        (token, previous.is_some())
    }

    /// Look up the handler bound to `action`.
    pub fn resolve(&self, action: &str) -> Option<Arc<H>> {
        self.handlers
            .read()
            .get(action)
            .map(|entry| Arc::clone(&entry.inner))
    }

    /// Returns `true` if a handler is bound to `action`.
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.read().contains_key(action)
    }

    /// Names of all bound actions, in no particular order.
    pub fn actions(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    /// Number of bound actions.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if no action is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Remove every binding.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl<H: ?Sized> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized + Send + Sync + 'static> Detach for HandlerRegistry<H> {
    fn detach(&self, token: Token) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|_, entry| entry.token != token);
        handlers.len() != before
    }

    fn is_attached(&self, token: Token) -> bool {
        self.handlers
            .read()
            .values()
            .any(|entry| entry.token == token)
    }
}

/// An ordered, copy-on-write list of registrations.
///
/// Readers take an O(1) [`snapshot`](OrderedList::snapshot) that stays
/// unchanged while the list is modified, which is what lets a dispatch run
/// against the plugins and hooks that were registered when it started.
pub struct OrderedList<E: ?Sized> {
    entries: RwLock<Arc<[Registered<E>]>>,
}

impl<E: ?Sized> OrderedList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new().into()),
        }
    }

    /// Append an item, returning its registration token.
    pub fn push(&self, item: Arc<E>) -> Token {
        let token = Token::next();
        let mut entries = self.entries.write();
        let mut next: Vec<Registered<E>> = entries.iter().cloned().collect();
        next.push(Registered { token, inner: item });
        *entries = next.into();
        token
    }

    /// The current registrations, in order.
    pub fn snapshot(&self) -> Arc<[Registered<E>]> {
        Arc::clone(&self.entries.read())
    }

    /// Remove the registration with `token`.
    pub fn remove(&self, token: Token) -> bool {
        let mut entries = self.entries.write();
        if !entries.iter().any(|entry| entry.token == token) {
            return false;
        }
        let next: Vec<Registered<E>> = entries
            .iter()
            .filter(|entry| entry.token != token)
            .cloned()
            .collect();
        *entries = next.into();
        true
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every registration.
    pub fn clear(&self) {
        *self.entries.write() = Vec::new().into();
    }
}

impl<E: ?Sized> Default for OrderedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + Send + Sync + 'static> Detach for OrderedList<E> {
    fn detach(&self, token: Token) -> bool {
        self.remove(token)
    }

    fn is_attached(&self, token: Token) -> bool {
        self.entries.read().iter().any(|entry| entry.token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_registry_last_write_wins() {
        let registry: HandlerRegistry<dyn Named> = HandlerRegistry::new();
        let (_, replaced) = registry.insert("a", Arc::new(Fixed("first")));
        assert!(!replaced);
        let (_, replaced) = registry.insert("a", Arc::new(Fixed("second")));
        assert!(replaced);

        assert_eq!(registry.resolve("a").map(|h| h.name()), Some("second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_stale_token_keeps_newer_handler() {
        let registry: HandlerRegistry<dyn Named> = HandlerRegistry::new();
        let (old, _) = registry.insert("a", Arc::new(Fixed("first")));
        let (new, _) = registry.insert("a", Arc::new(Fixed("second")));

        assert!(!registry.detach(old));
        assert!(registry.contains("a"));
        assert!(registry.detach(new));
        assert!(registry.resolve("a").is_none());
    }

    #[test]
    fn test_ordered_list_snapshot_is_stable() {
        let list: OrderedList<dyn Named> = OrderedList::new();
        let first = list.push(Arc::new(Fixed("one")));
        list.push(Arc::new(Fixed("two")));

        let snapshot = list.snapshot();
        list.push(Arc::new(Fixed("three")));
        assert!(list.remove(first));

        let names: Vec<_> = snapshot.iter().map(|e| e.get().name()).collect();
        assert_eq!(names, vec!["one", "two"]);

        let names: Vec<_> = list.snapshot().iter().map(|e| e.get().name()).collect();
        assert_eq!(names, vec!["two", "three"]);
    }

    #[test]
    fn test_ordered_list_removes_by_identity() {
        let list: OrderedList<dyn Named> = OrderedList::new();
        let a = list.push(Arc::new(Fixed("same")));
        let b = list.push(Arc::new(Fixed("same")));

        assert!(list.remove(a));
        assert!(!list.remove(a));
        assert!(list.is_attached(b));
        assert_eq!(list.len(), 1);
    }
}
