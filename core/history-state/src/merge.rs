//! Merge-on-write replacement.
//!
//! Wraps a host so that `replace_state` merges the proposed object into the
//! current one at the top level instead of overwriting it. Proposed keys win;
//! every other existing key is kept as-is. Title and URL pass through
//! untouched, so the host's replace contract is otherwise unchanged.

use std::rc::Rc;

use tracing::debug;

use crate::host::{HistoryHost, HostState};

/// Shallow merge: `{ ...current, ...proposed }`.
pub fn merge_state(current: Option<HostState>, proposed: HostState) -> HostState {
    let mut merged = current.unwrap_or_default();
    merged.extend(proposed);
    merged
}

/// A host whose `replace_state` merges instead of overwriting.
pub struct MergingHistory {
    inner: Rc<dyn HistoryHost>,
    // Inner host already merges; wrapping again would only repeat the work.
    passthrough: bool,
}

impl MergingHistory {
    /// Installs the merge layer over `host`.
    ///
    /// A host that already merges is forwarded to directly, so installing
    /// over an installed layer never stacks a second merge.
    pub fn install(host: Rc<dyn HistoryHost>) -> Self {
        let passthrough = host.merges_on_replace();
        debug!(passthrough, "Installed merge-on-write replace_state");
        MergingHistory {
            inner: host,
            passthrough,
        }
    }

    /// The wrapped host.
    pub fn inner(&self) -> &Rc<dyn HistoryHost> {
        &self.inner
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }
}

impl HistoryHost for MergingHistory {
    fn current_state(&self) -> Option<HostState> {
        self.inner.current_state()
    }

    fn replace_state(&self, state: HostState, title: &str, url: Option<&str>) {
        if self.passthrough {
            self.inner.replace_state(state, title, url);
            return;
        }
        let merged = merge_state(self.inner.current_state(), state);
        self.inner.replace_state(merged, title, url);
    }

    fn merges_on_replace(&self) -> bool {
        true
    }
}
