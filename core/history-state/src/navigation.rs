//! Navigation listeners.
//!
//! Bindings register here so the owner of a store can fan a single
//! "the active entry changed" signal out to every live binding. Listeners
//! are held weakly; a dropped binding simply stops being notified.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

/// Something that re-reads history state after the active entry changes.
pub trait NavigationListener {
    fn on_navigation(&self);
}

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Weak<dyn NavigationListener>)>>,
}

impl Listeners {
    pub(crate) fn subscribe(
        self: &Rc<Self>,
        listener: Weak<dyn NavigationListener>,
    ) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        Subscription {
            id,
            listeners: Rc::downgrade(self),
        }
    }

    /// Notifies every live listener, returning how many were reached.
    pub(crate) fn notify(&self) -> usize {
        // Collect first: a listener may subscribe or unsubscribe while running.
        let live: Vec<Rc<dyn NavigationListener>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|(_, weak)| weak.strong_count() > 0);
            entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        trace!(count = live.len(), "Dispatching navigation to listeners");
        for listener in &live {
            listener.on_navigation();
        }
        live.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Registration handle. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}
