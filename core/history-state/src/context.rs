//! Execution context: is a history capability available, and if so, which.
//!
//! The merge layer is installed lazily, exactly once per context, the first
//! time anything asks for it. Headless contexts (server rendering, tests of
//! non-interactive paths) never install anything and make every store and
//! binding operation degrade to a read of `None` or a no-op.

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::host::HistoryHost;
use crate::merge::MergingHistory;

pub struct ExecutionContext {
    host: Option<Rc<dyn HistoryHost>>,
    history: OnceCell<Rc<MergingHistory>>,
}

impl ExecutionContext {
    /// A client context backed by `host`.
    pub fn client<H: HistoryHost + 'static>(host: H) -> Self {
        ExecutionContext {
            host: Some(Rc::new(host)),
            history: OnceCell::new(),
        }
    }

    /// A context without any history capability.
    pub fn headless() -> Self {
        ExecutionContext {
            host: None,
            history: OnceCell::new(),
        }
    }

    /// Builds a context from the environment's capability flag.
    ///
    /// When `is_client` is false the host is dropped unused.
    pub fn from_flag<H: HistoryHost + 'static>(is_client: bool, host: H) -> Self {
        if is_client {
            ExecutionContext::client(host)
        } else {
            debug!("No client execution context; history state disabled");
            ExecutionContext::headless()
        }
    }

    pub fn is_client(&self) -> bool {
        self.host.is_some()
    }

    /// Whether the merge layer has been installed yet.
    pub fn is_installed(&self) -> bool {
        self.history.get().is_some()
    }

    /// The merge-on-write history, installing it on first call.
    pub fn history(&self) -> Option<Rc<MergingHistory>> {
        let host = self.host.as_ref()?;
        let history = self
            .history
            .get_or_init(|| Rc::new(MergingHistory::install(Rc::clone(host))));
        Some(Rc::clone(history))
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("is_client", &self.is_client())
            .field("is_installed", &self.is_installed())
            .finish()
    }
}
