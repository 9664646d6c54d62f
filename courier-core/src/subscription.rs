//! Registration tokens and the capability to undo a registration.

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of a single registration.
///
/// Tokens are unique per process, so registering the same logic twice yields
/// two distinct registrations that can be removed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

impl Token {
    /// Allocate a fresh token.
    pub fn next() -> Self {
        Token(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// A collection a registration can be removed from.
pub trait Detach: Send + Sync + 'static {
    /// Remove the registration identified by `token`.
    ///
    /// Returns `true` if something was removed.
    fn detach(&self, token: Token) -> bool;

    /// Returns `true` if the registration is still present.
    fn is_attached(&self, token: Token) -> bool;
}

/// Capability returned by every registration; calling
/// [`unsubscribe`](Subscription::unsubscribe) removes exactly that
/// registration.
///
/// Dropping a `Subscription` does **not** unregister anything. The
/// subscription only holds a weak reference, so it never keeps a dispatcher
/// alive, and unsubscribing after the dispatcher is gone is a no-op.
#[derive(Clone)]
pub struct Subscription {
    target: Weak<dyn Detach>,
    token: Token,
}

impl Subscription {
    /// Create a subscription for `token` inside `target`.
    pub fn new<D: Detach>(target: &Arc<D>, token: Token) -> Self {
        let target: Weak<dyn Detach> = Arc::downgrade(target) as Weak<dyn Detach>;
        Self { target, token }
    }

    /// The registration token.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Remove the registration.
    ///
    /// Idempotent: returns `true` only for the call that actually removed it.
    pub fn unsubscribe(&self) -> bool {
        self.target
            .upgrade()
            .is_some_and(|target| target.detach(self.token))
    }

    /// Returns `true` while the registration is in place.
    pub fn is_active(&self) -> bool {
        self.target
            .upgrade()
            .is_some_and(|target| target.is_attached(self.token))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}
