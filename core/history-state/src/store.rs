//! Keyed values inside one namespace field of the host state.
//!
//! Every value lives under `state.page[key]` (the field name is configurable).
//! Writes rebuild the namespace object and hand `{ page }` to the merge-on-write
//! history, so top-level fields owned by the host or other libraries survive.
//!
//! # Graceful degradation
//!
//! Reads never fail: no client context, no state, no namespace object, no
//! entry, or an entry of the wrong shape all read as `None`. Writes never
//! fail either: without a client context they are no-ops, and values that
//! cannot be serialized are dropped with a warning. Use [`try_get`] and
//! [`try_set`] to observe the serde failures instead.
//!
//! [`try_get`]: NamespacedHistoryStore::try_get
//! [`try_set`]: NamespacedHistoryStore::try_set

use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::HistoryStateConfig;
use crate::context::ExecutionContext;
use crate::error::{HistoryError, Result};
use crate::host::{HistoryHost, HostState};
use crate::navigation::{Listeners, NavigationListener, Subscription};

/// Returns the namespace object of `state`, if there is a well-formed one.
fn namespace_of<'a>(state: &'a HostState, field: &str) -> Option<&'a Map<String, Value>> {
    match state.get(field)? {
        Value::Object(map) => Some(map),
        other => {
            warn!(
                namespace = field,
                kind = value_kind(other),
                "History state namespace is not an object; treating as empty"
            );
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct StoreInner {
    context: Rc<ExecutionContext>,
    config: HistoryStateConfig,
    listeners: Rc<Listeners>,
}

/// Get/set access to keyed values stored in the current history entry.
///
/// Cheap to clone; clones share the context and the listener list.
#[derive(Clone)]
pub struct NamespacedHistoryStore {
    inner: Rc<StoreInner>,
}

impl NamespacedHistoryStore {
    pub fn new(context: Rc<ExecutionContext>) -> Self {
        NamespacedHistoryStore::with_config(context, HistoryStateConfig::default())
    }

    pub fn with_config(context: Rc<ExecutionContext>, config: HistoryStateConfig) -> Self {
        NamespacedHistoryStore {
            inner: Rc::new(StoreInner {
                context,
                config,
                listeners: Rc::new(Listeners::default()),
            }),
        }
    }

    pub fn context(&self) -> &Rc<ExecutionContext> {
        &self.inner.context
    }

    pub fn config(&self) -> &HistoryStateConfig {
        &self.inner.config
    }

    pub fn is_client(&self) -> bool {
        self.inner.context.is_client()
    }

    fn namespace(&self) -> Option<Map<String, Value>> {
        let history = self.inner.context.history()?;
        let state = history.current_state()?;
        namespace_of(&state, &self.inner.config.namespace).cloned()
    }

    /// Raw JSON value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.namespace()?.remove(key)
    }

    /// Value stored under `key`, or an error if it doesn't deserialize as `T`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get_value(key) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| HistoryError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    /// Value stored under `key`. Anything unreadable comes back as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable history state value");
                None
            }
        }
    }

    /// Keys currently present in the namespace.
    pub fn keys(&self) -> Vec<String> {
        self.namespace()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stores a raw JSON value under `key`.
    ///
    /// With `replace_namespace` the namespace becomes `{ key: value }` and
    /// every sibling key is dropped; otherwise siblings are preserved.
    pub fn set_value(&self, key: &str, value: Value, replace_namespace: bool) {
        let Some(history) = self.inner.context.history() else {
            debug!(key, "No client execution context; skipping history write");
            return;
        };
        let field = &self.inner.config.namespace;

        let mut page = if replace_namespace {
            Map::new()
        } else {
            history
                .current_state()
                .and_then(|state| namespace_of(&state, field).cloned())
                .unwrap_or_default()
        };
        page.insert(key.to_string(), value);

        let mut proposed = HostState::new();
        proposed.insert(field.clone(), Value::Object(page));
        history.replace_state(proposed, &self.inner.config.title, None);
        debug!(key, replace_namespace, "Wrote history state");
    }

    /// Serializes and stores `value` under `key`.
    pub fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        replace_namespace: bool,
    ) -> Result<()> {
        if !self.is_client() {
            debug!(key, "No client execution context; skipping history write");
            return Ok(());
        }
        let value = serde_json::to_value(value).map_err(|source| HistoryError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.set_value(key, value, replace_namespace);
        Ok(())
    }

    /// Serializes and stores `value` under `key`, dropping it if it can't be serialized.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, replace_namespace: bool) {
        if let Err(e) = self.try_set(key, value, replace_namespace) {
            warn!(key, error = %e, "Dropping history state write");
        }
    }

    /// Registers a listener for [`notify_navigation`](Self::notify_navigation).
    pub fn subscribe(&self, listener: Weak<dyn NavigationListener>) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    /// Tells every live binding that the active entry changed (back/forward,
    /// reload restore), so each re-reads its key. Returns the number reached.
    pub fn notify_navigation(&self) -> usize {
        self.inner.listeners.notify()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}
