//! The host environment's navigation history, seen as a black box.
//!
//! A host exposes two primitives on the currently active entry: read its state
//! object and replace it. [`MemoryHistory`] is a complete in-memory host with a
//! navigation stack, used by tests and by embedders without a real history.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

/// The state object attached to one navigation entry.
pub type HostState = Map<String, Value>;

/// The host's history capability for the currently active entry.
///
/// Implementations are single-threaded and shared through `Rc`, so both
/// methods take `&self` and rely on interior mutability.
pub trait HistoryHost {
    /// Returns a snapshot of the current entry's state, if it has one.
    fn current_state(&self) -> Option<HostState>;

    /// Replaces the current entry's state without creating a new entry.
    ///
    /// `url` of `None` leaves the entry's URL unchanged.
    fn replace_state(&self, state: HostState, title: &str, url: Option<&str>);

    /// Whether `replace_state` already merges into the existing state.
    fn merges_on_replace(&self) -> bool {
        false
    }
}

impl<H: HistoryHost + ?Sized> HistoryHost for Rc<H> {
    fn current_state(&self) -> Option<HostState> {
        (**self).current_state()
    }

    fn replace_state(&self, state: HostState, title: &str, url: Option<&str>) {
        (**self).replace_state(state, title, url)
    }

    fn merges_on_replace(&self) -> bool {
        (**self).merges_on_replace()
    }
}

/// One entry of a [`MemoryHistory`] stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub state: Option<HostState>,
    pub title: String,
    pub url: String,
}

impl HistoryEntry {
    fn new(state: Option<HostState>, url: &str) -> Self {
        HistoryEntry {
            state,
            title: String::new(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug)]
struct Stack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// In-memory navigation stack with push/replace/back/forward semantics.
///
/// `replace_state` overwrites the current entry's state wholesale, like a
/// browser does. Merging is layered on by [`crate::MergingHistory`].
#[derive(Debug)]
pub struct MemoryHistory {
    stack: RefCell<Stack>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        MemoryHistory::new("/")
    }
}

impl MemoryHistory {
    /// Creates a history with a single stateless entry at `url`.
    pub fn new(url: &str) -> Self {
        MemoryHistory {
            stack: RefCell::new(Stack {
                entries: vec![HistoryEntry::new(None, url)],
                index: 0,
            }),
        }
    }

    /// Pushes a new entry after the current one, discarding forward entries.
    ///
    /// `url` of `None` reuses the current entry's URL.
    pub fn push_state(&self, state: Option<HostState>, url: Option<&str>) {
        let mut stack = self.stack.borrow_mut();
        let next_url = match url {
            Some(url) => url.to_string(),
            None => stack.entries[stack.index].url.clone(),
        };
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry::new(state, &next_url));
        stack.index = keep;
    }

    /// Moves one entry back. Returns `false` at the start of the stack.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Moves one entry forward. Returns `false` at the end of the stack.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Moves `delta` entries. Out-of-range moves (and `go(0)`) do nothing.
    pub fn go(&self, delta: isize) -> bool {
        let mut stack = self.stack.borrow_mut();
        let target = stack.index as isize + delta;
        if delta == 0 || target < 0 || target >= stack.entries.len() as isize {
            return false;
        }
        stack.index = target as usize;
        true
    }

    /// Number of entries. Never zero: the initial entry always exists.
    pub fn entry_count(&self) -> usize {
        self.stack.borrow().entries.len()
    }

    /// Position of the active entry.
    pub fn index(&self) -> usize {
        self.stack.borrow().index
    }

    pub fn current_url(&self) -> String {
        let stack = self.stack.borrow();
        stack.entries[stack.index].url.clone()
    }

    pub fn current_entry(&self) -> HistoryEntry {
        let stack = self.stack.borrow();
        stack.entries[stack.index].clone()
    }

    pub fn entry(&self, index: usize) -> Option<HistoryEntry> {
        self.stack.borrow().entries.get(index).cloned()
    }
}

impl HistoryHost for MemoryHistory {
    fn current_state(&self) -> Option<HostState> {
        let stack = self.stack.borrow();
        stack.entries[stack.index].state.clone()
    }

    fn replace_state(&self, state: HostState, title: &str, url: Option<&str>) {
        let mut stack = self.stack.borrow_mut();
        let index = stack.index;
        let entry = &mut stack.entries[index];
        entry.state = Some(state);
        entry.title = title.to_string();
        if let Some(url) = url {
            entry.url = url.to_string();
        }
    }
}
