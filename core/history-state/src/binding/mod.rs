//! Per-key bindings: a live value plus a setter, backed by history state.
//!
//! A binding seeds itself from the store (falling back to the caller's
//! initial value), keeps a cached copy, and writes every change through to
//! the store. The cache is re-checked against the store whenever:
//!
//! - the owner rebinds to a different key ([`ScopedStateBinding::rebind`]),
//! - the owner reports a navigation ([`ScopedStateBinding::resync`] or
//!   [`NamespacedHistoryStore::notify_navigation`] for all bindings at once).
//!
//! A resync only ever adopts a *defined* stored value. If the entry has
//! nothing under the key, the cached value is kept as last-known-good.
//!
//! # Module Structure
//!
//! - [`types`]: `StateUpdate`, `BindingOptions`, `BindingPhase`, `SyncOutcome`

mod types;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::navigation::{NavigationListener, Subscription};
use crate::store::NamespacedHistoryStore;

pub use types::{BindingOptions, BindingPhase, StateUpdate, SyncOutcome};

/// Bounds every bound value type must meet.
pub trait BindingValue: Clone + PartialEq + Serialize + DeserializeOwned + 'static {}

impl<T> BindingValue for T where T: Clone + PartialEq + Serialize + DeserializeOwned + 'static {}

struct BindingShared<T> {
    store: NamespacedHistoryStore,
    key: RefCell<String>,
    value: RefCell<T>,
    phase: Cell<BindingPhase>,
    torn_down: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
}

impl<T: BindingValue> BindingShared<T> {
    fn resync(&self) -> SyncOutcome {
        if self.torn_down.get() || !self.store.is_client() {
            return SyncOutcome::Skipped;
        }
        self.phase.set(BindingPhase::Resynchronizing);
        let key = self.key.borrow().clone();

        let outcome = match self.store.get::<T>(&key) {
            None => SyncOutcome::Absent,
            Some(stored) if stored == *self.value.borrow() => SyncOutcome::Unchanged,
            Some(stored) => {
                *self.value.borrow_mut() = stored;
                SyncOutcome::Updated
            }
        };

        self.phase.set(BindingPhase::Synchronized);
        debug!(key = %key, outcome = ?outcome, "Resynchronized history state binding");
        outcome
    }

    fn write(&self, update: StateUpdate<T>, replace: bool) {
        if self.torn_down.get() {
            debug!(key = %self.key.borrow(), "Ignoring write to torn-down binding");
            return;
        }
        if !self.store.is_client() {
            debug!(key = %self.key.borrow(), "No client execution context; ignoring write");
            return;
        }

        // Updaters get a snapshot so they may read the binding themselves.
        let previous = self.value.borrow().clone();
        let next = update.resolve(&previous);

        // Store first: the cache only takes values the entry actually holds.
        let key = self.key.borrow().clone();
        if let Err(e) = self.store.try_set(&key, &next, replace) {
            warn!(key = %key, error = %e, "Dropping binding write; cached value unchanged");
            return;
        }
        *self.value.borrow_mut() = next;
        self.phase.set(BindingPhase::Synchronized);
    }
}

impl<T: BindingValue> NavigationListener for BindingShared<T> {
    fn on_navigation(&self) {
        self.resync();
    }
}

/// A live value scoped by key, persisted in the current history entry.
///
/// Dropping the binding (or calling [`teardown`](Self::teardown)) stops
/// resynchronization and turns outstanding setters into no-ops.
pub struct ScopedStateBinding<T: BindingValue> {
    shared: Rc<BindingShared<T>>,
}

impl<T: BindingValue> ScopedStateBinding<T> {
    pub fn new(store: &NamespacedHistoryStore, options: BindingOptions<T>) -> Self {
        let BindingOptions { initial_state, key } = options;

        let initial = if store.is_client() {
            store.get::<T>(&key).unwrap_or(initial_state)
        } else {
            initial_state
        };

        let shared = Rc::new_cyclic(|weak: &Weak<BindingShared<T>>| {
            let listener: Weak<dyn NavigationListener> = weak.clone();
            BindingShared {
                store: store.clone(),
                key: RefCell::new(key),
                value: RefCell::new(initial),
                phase: Cell::new(BindingPhase::Initialized),
                torn_down: Cell::new(false),
                subscription: RefCell::new(Some(store.subscribe(listener))),
            }
        });

        ScopedStateBinding { shared }
    }

    /// Current cached value.
    pub fn read(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Runs `f` on a snapshot of the cached value.
    ///
    /// `f` may write through this binding or trigger a resync; it sees the
    /// value as it was when the call started.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let snapshot = self.read();
        f(&snapshot)
    }

    pub fn key(&self) -> String {
        self.shared.key.borrow().clone()
    }

    pub fn phase(&self) -> BindingPhase {
        self.shared.phase.get()
    }

    /// Updates the cache and writes through to the store.
    ///
    /// `replace` makes this key the only one left in the namespace; otherwise
    /// sibling keys are kept. Does nothing without a client context.
    pub fn write(&self, update: impl Into<StateUpdate<T>>, replace: bool) {
        self.shared.write(update.into(), replace);
    }

    /// Stores `value`, keeping sibling keys.
    pub fn set(&self, value: T) {
        self.write(StateUpdate::Value(value), false);
    }

    /// Stores `f(current)`, keeping sibling keys.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.write(StateUpdate::updater(f), false);
    }

    /// Re-reads the store and adopts a defined stored value that differs
    /// from the cache.
    pub fn resync(&self) -> SyncOutcome {
        self.shared.resync()
    }

    /// Switches the binding to `key`, then resyncs.
    ///
    /// Rebinding to the key already in use is not an identity change and
    /// returns [`SyncOutcome::Unchanged`] without touching the store. The
    /// cached value carries over when the new key has nothing stored.
    pub fn rebind(&self, key: &str) -> SyncOutcome {
        if *self.shared.key.borrow() == key {
            return SyncOutcome::Unchanged;
        }
        debug!(from = %self.shared.key.borrow(), to = key, "Rebinding history state binding");
        *self.shared.key.borrow_mut() = key.to_string();
        self.shared.resync()
    }

    /// A cloneable setter tied to this binding.
    pub fn setter(&self) -> StateSetter<T> {
        StateSetter {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// The `(value, setter)` pair.
    pub fn pair(&self) -> (T, StateSetter<T>) {
        (self.read(), self.setter())
    }

    /// Stops resynchronization and detaches every setter.
    ///
    /// The binding keeps its last value for reads; writes and resyncs through
    /// it or its setters are ignored from here on. Dropping the binding has
    /// the same effect.
    pub fn teardown(&self) {
        if self.shared.torn_down.replace(true) {
            return;
        }
        self.shared.torn_down.set(true);
        self.shared.subscription.borrow_mut().take();
        debug!(key = %self.shared.key.borrow(), "Tore down history state binding");
    }
}

impl<T: BindingValue + fmt::Debug> fmt::Debug for ScopedStateBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedStateBinding")
            .field("key", &self.shared.key.borrow())
            .field("value", &self.shared.value.borrow())
            .field("phase", &self.shared.phase.get())
            .finish()
    }
}

/// Write half of a binding. Becomes a no-op once the binding is gone.
pub struct StateSetter<T: BindingValue> {
    shared: Weak<BindingShared<T>>,
}

impl<T: BindingValue> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        StateSetter {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T: BindingValue> StateSetter<T> {
    pub fn write(&self, update: impl Into<StateUpdate<T>>, replace: bool) {
        match self.shared.upgrade() {
            Some(shared) => shared.write(update.into(), replace),
            None => debug!("Ignoring write through detached history state setter"),
        }
    }

    pub fn set(&self, value: T) {
        self.write(StateUpdate::Value(value), false);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.write(StateUpdate::updater(f), false);
    }

    pub fn is_attached(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| !shared.torn_down.get())
    }
}

impl<T: BindingValue> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl NamespacedHistoryStore {
    /// Creates a binding over this store.
    pub fn bind<T: BindingValue>(&self, options: BindingOptions<T>) -> ScopedStateBinding<T> {
        ScopedStateBinding::new(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::host::MemoryHistory;

    fn client_store() -> (Rc<MemoryHistory>, NamespacedHistoryStore) {
        let host = Rc::new(MemoryHistory::new("/"));
        let context = Rc::new(ExecutionContext::client(Rc::clone(&host)));
        (host, NamespacedHistoryStore::new(context))
    }

    #[test]
    fn test_falls_back_to_initial_state() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(10i32, "count"));
        assert_eq!(binding.read(), 10);
        assert_eq!(binding.phase(), BindingPhase::Initialized);
    }

    #[test]
    fn test_seeds_from_stored_value() {
        let (_host, store) = client_store();
        store.set("count", &3, false);
        let binding = store.bind(BindingOptions::new(10i32, "count"));
        assert_eq!(binding.read(), 3);
    }

    #[test]
    fn test_unreadable_stored_value_falls_back() {
        let (_host, store) = client_store();
        store.set("count", "three", false);
        let binding = store.bind(BindingOptions::new(10i32, "count"));
        assert_eq!(binding.read(), 10);
    }

    #[test]
    fn test_updater_write() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(5i32, "count"));
        binding.update(|prev| prev + 1);

        assert_eq!(binding.read(), 6);
        assert_eq!(store.get::<i32>("count"), Some(6));
        assert_eq!(binding.phase(), BindingPhase::Synchronized);
    }

    #[test]
    fn test_direct_write_with_replace_clears_siblings() {
        let (_host, store) = client_store();
        store.set("other", "x", false);
        let binding = store.bind(BindingOptions::new(0i32, "count"));
        binding.write(9i32, true);

        assert_eq!(store.get::<i32>("count"), Some(9));
        assert_eq!(store.get::<String>("other"), None);
    }

    #[test]
    fn test_rebind_adopts_stored_value() {
        let (_host, store) = client_store();
        store.set("k2", &"B".to_string(), false);
        let binding = store.bind(BindingOptions::new("A".to_string(), "k1"));

        assert_eq!(binding.rebind("k2"), SyncOutcome::Updated);
        assert_eq!(binding.read(), "B");
        assert_eq!(binding.key(), "k2");
    }

    #[test]
    fn test_rebind_same_key_is_not_a_change() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(1i32, "k"));
        store.set("k", &2, false);

        assert_eq!(binding.rebind("k"), SyncOutcome::Unchanged);
        assert_eq!(binding.read(), 1);
    }

    #[test]
    fn test_rebind_to_empty_key_keeps_last_known_value() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(1i32, "k1"));
        binding.set(4);

        assert_eq!(binding.rebind("k2"), SyncOutcome::Absent);
        assert_eq!(binding.read(), 4);
    }

    #[test]
    fn test_setter_writes_through() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(vec![1i32], "list"));
        let (value, set_value) = binding.pair();
        assert_eq!(value, vec![1]);

        set_value.update(|prev| {
            let mut next = prev.clone();
            next.push(2);
            next
        });
        assert_eq!(binding.read(), vec![1, 2]);
        assert_eq!(store.get::<Vec<i32>>("list"), Some(vec![1, 2]));
    }

    #[test]
    fn test_setter_detached_after_teardown() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(0i32, "k"));
        let setter = binding.setter();
        assert!(setter.is_attached());

        binding.teardown();
        assert!(!setter.is_attached());
        setter.set(5);
        assert_eq!(store.get::<i32>("k"), None);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_torn_down_binding_keeps_value_and_ignores_updates() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(1i32, "k"));
        binding.set(2);
        binding.teardown();

        binding.set(3);
        store.set("k", &7, false);
        assert_eq!(binding.resync(), SyncOutcome::Skipped);
        assert_eq!(store.notify_navigation(), 0);
        assert_eq!(binding.read(), 2);
        assert_eq!(store.get::<i32>("k"), Some(7));

        // Idempotent.
        binding.teardown();
        assert_eq!(binding.read(), 2);
    }

    #[test]
    fn test_setter_inside_with_value_writes_through() {
        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(1i32, "k"));
        let setter = binding.setter();

        let seen = binding.with_value(|value| {
            setter.set(*value + 1);
            *value
        });
        assert_eq!(seen, 1);
        assert_eq!(binding.read(), 2);
        assert_eq!(store.get::<i32>("k"), Some(2));
    }

    #[test]
    fn test_navigation_inside_with_value_resyncs() {
        let (host, store) = client_store();
        let binding = store.bind(BindingOptions::new(1i32, "k"));
        binding.set(2);
        host.push_state(None, Some("/next"));
        store.set("k", &9, false);

        binding.with_value(|value| {
            assert_eq!(*value, 2);
            assert_eq!(store.notify_navigation(), 1);
        });
        assert_eq!(binding.read(), 9);
    }

    #[test]
    fn test_unserializable_write_leaves_cache_matching_store() {
        use std::collections::HashMap;

        let (_host, store) = client_store();
        let binding = store.bind(BindingOptions::new(
            HashMap::<(i32, i32), i32>::new(),
            "grid",
        ));

        let mut grid = HashMap::new();
        grid.insert((1, 2), 3);
        binding.set(grid);

        assert!(binding.read().is_empty());
        assert_eq!(store.get_value("grid"), None);
        assert_eq!(binding.phase(), BindingPhase::Initialized);
    }

    #[test]
    fn test_headless_write_is_noop() {
        let store = NamespacedHistoryStore::new(Rc::new(ExecutionContext::headless()));
        let binding = store.bind(BindingOptions::new(2i32, "k"));
        binding.set(3);
        binding.update(|prev| prev * 10);

        assert_eq!(binding.read(), 2);
        assert_eq!(binding.resync(), SyncOutcome::Skipped);
    }
}
