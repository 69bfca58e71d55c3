//! # history-state
//!
//! Application state attached to the current navigation history entry, so it
//! comes back on back/forward navigation and reloads without any external
//! storage.
//!
//! ## Design Principles
//!
//! - **Synchronous**: Every operation completes before returning. No async runtime.
//! - **Not thread-safe**: Single UI thread; everything is shared through `Rc`.
//! - **Graceful degradation**: Missing state reads as `None`, headless writes are
//!   no-ops, unreadable values fall back to defaults. Nothing here panics or
//!   surfaces an error to the consuming application.
//! - **Injected host**: The history capability is a [`HistoryHost`] handed to an
//!   [`ExecutionContext`], never an ambient global, so tests supply a fake.
//!
//! ## Layout in the host state
//!
//! ```json
//! {
//!   "page": { "filters": { "query": "rust" }, "tab": "activity" },
//!   "...": "fields owned by the host or other libraries, never touched"
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use history_state::{BindingOptions, ExecutionContext, MemoryHistory, NamespacedHistoryStore};
//!
//! let context = Rc::new(ExecutionContext::client(MemoryHistory::new("/")));
//! let store = NamespacedHistoryStore::new(context);
//!
//! let binding = store.bind(BindingOptions::new(0u32, "page-index"));
//! let (page_index, set_page_index) = binding.pair();
//! set_page_index.update(|prev| prev + 1);
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod merge;
pub mod navigation;
pub mod store;

pub use binding::{
    BindingOptions, BindingPhase, BindingValue, ScopedStateBinding, StateSetter, StateUpdate,
    SyncOutcome,
};
pub use config::{HistoryStateConfig, DEFAULT_NAMESPACE};
pub use context::ExecutionContext;
pub use error::{HistoryError, Result};
pub use host::{HistoryEntry, HistoryHost, HostState, MemoryHistory};
pub use merge::{merge_state, MergingHistory};
pub use navigation::{NavigationListener, Subscription};
pub use store::NamespacedHistoryStore;
