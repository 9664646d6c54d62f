//! Process-wide shared dispatchers.
//!
//! Many independent call sites can reach one dispatcher without passing a
//! handle around. Each dispatcher *type* gets its own slot:
//!
//! - [`shared`] returns the instance, creating it with `Default` on first
//!   access;
//! - [`install`] replaces it wholesale (e.g. with a preconfigured instance, or
//!   a fresh one in tests) and returns the previous instance;
//! - [`reset`] empties the slot so the next [`shared`] call starts over.
//!
//! Passing an explicit `Dispatcher` handle remains the preferred option; this
//! module exists for code that cannot be wired that way.
//!
//! # Example
//!
//! ```rust
//! use courier::{Dispatcher, global};
//!
//! type AppBus = Dispatcher<String, (), usize>;
//!
//! global::shared::<AppBus>().register_fn("text.len", |cmd| Ok(cmd.target.len()));
//!
//! let outcome = global::shared::<AppBus>()
//!     .dispatch("text.len", "hello".to_string())
//!     .unwrap();
//! assert_eq!(outcome.value(), Some(&5));
//! ```

use parking_lot::RwLock;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock},
};

type Slot = Arc<dyn Any + Send + Sync>;

static SLOTS: LazyLock<RwLock<HashMap<TypeId, Slot>>> = LazyLock::new(Default::default);

/// The shared instance of `D`, created on first access.
pub fn shared<D>() -> Arc<D>
where
    D: Default + Send + Sync + 'static,
{
    let existing = SLOTS.read().get(&TypeId::of::<D>()).cloned();
    if let Some(Ok(instance)) = existing.map(|slot| slot.downcast::<D>()) {
        return instance;
    }

    // `D::default()` runs without the lock held; it may reach other slots.
    let fresh: Slot = Arc::new(D::default());
    let slot = Arc::clone(SLOTS.write().entry(TypeId::of::<D>()).or_insert(fresh));
    match slot.downcast::<D>() {
        Ok(instance) => instance,
        Err(_) => {
            let instance = Arc::new(D::default());
            SLOTS.write().insert(TypeId::of::<D>(), instance.clone() as Slot);
            instance
        }
    }
}

/// Replace the shared instance of `D`, returning the previous one.
pub fn install<D>(instance: Arc<D>) -> Option<Arc<D>>
where
    D: Send + Sync + 'static,
{
    SLOTS
        .write()
        .insert(TypeId::of::<D>(), instance)
        .and_then(|previous| previous.downcast::<D>().ok())
}

/// Drop the shared instance of `D`, returning it if one existed.
pub fn reset<D>() -> Option<Arc<D>>
where
    D: Send + Sync + 'static,
{
    SLOTS
        .write()
        .remove(&TypeId::of::<D>())
        .and_then(|previous| previous.downcast::<D>().ok())
}
