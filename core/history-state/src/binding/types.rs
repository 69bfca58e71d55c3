//! Input and status types shared by bindings and setters.

use std::fmt;

/// What a write stores: a value, or a function of the current value.
pub enum StateUpdate<T> {
    Value(T),
    Updater(Box<dyn FnOnce(&T) -> T>),
}

impl<T> StateUpdate<T> {
    pub fn updater<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + 'static,
    {
        StateUpdate::Updater(Box::new(f))
    }

    /// Produces the concrete next value given the current one.
    pub fn resolve(self, previous: &T) -> T {
        match self {
            StateUpdate::Value(value) => value,
            StateUpdate::Updater(f) => f(previous),
        }
    }
}

impl<T> From<T> for StateUpdate<T> {
    fn from(value: T) -> Self {
        StateUpdate::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for StateUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Value(value) => f.debug_tuple("Value").field(value).finish(),
            StateUpdate::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// Construction inputs for a binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingOptions<T> {
    /// Used when the current entry has nothing stored under `key`.
    pub initial_state: T,
    pub key: String,
}

impl<T> BindingOptions<T> {
    pub fn new(initial_state: T, key: impl Into<String>) -> Self {
        BindingOptions {
            initial_state,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// Seeded, no resync or write has happened yet.
    Initialized,
    /// Cached value mirrors the store.
    Synchronized,
    /// A resync check is running.
    Resynchronizing,
}

/// Result of a resync check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Stored value matches the cache (or the key did not change).
    Unchanged,
    /// Cache was replaced by the stored value.
    Updated,
    /// Nothing stored under the key; the last known value is kept.
    Absent,
    /// No client context, or the binding was torn down.
    Skipped,
}
