use super::context::Context;
use ferrous_rdns_domain::{BrokerError, ContextId};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

#[derive(Default)]
struct Inner {
    contexts: FxHashMap<ContextId, Arc<Context>>,
    closed: bool,
}

/// Live contexts of one broker.
///
/// Lookups take the shared lock; only insertion and removal are exclusive.
/// Contexts are always stopped after they leave the map, never under its lock.
#[derive(Default)]
pub struct ContextRegistry {
    inner: RwLock<Inner>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| {
            warn!("Context registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| {
            warn!("Context registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Fails with `NotInitialized` once the registry has been drained; the
    /// context is handed back so the caller can stop it.
    pub fn insert(&self, context: Arc<Context>) -> Result<(), (BrokerError, Arc<Context>)> {
        let mut inner = self.write();
        if inner.closed {
            return Err((BrokerError::NotInitialized, context));
        }
        inner.contexts.insert(context.id(), context);
        Ok(())
    }

    pub fn get(&self, id: ContextId) -> Option<Arc<Context>> {
        self.read().contexts.get(&id).cloned()
    }

    pub fn remove(&self, id: ContextId) -> Option<Arc<Context>> {
        self.write().contexts.remove(&id)
    }

    /// Empties the registry for good. Later insertions are refused.
    pub fn drain(&self) -> Vec<Arc<Context>> {
        let mut inner = self.write();
        inner.closed = true;
        inner.contexts.drain().map(|(_, context)| context).collect()
    }

    pub fn ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<ContextId> = self.read().contexts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }
}
