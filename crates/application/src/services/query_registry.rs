use ferrous_rdns_domain::{BrokerError, CompletionCallback, ContextId, LookupOutcome, QueryId};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::warn;

/// One reverse lookup between engine submission and completion.
pub struct PendingQuery {
    pub id: QueryId,
    pub context_id: ContextId,
    pub expires_at: Instant,
    pub expired: bool,
    pub reverse_name: String,
    // `Mutex` keeps the registry `Sync` for a callback that is only `Send`
    callback: Mutex<CompletionCallback>,
}

impl PendingQuery {
    pub fn new(
        id: QueryId,
        context_id: ContextId,
        expires_at: Instant,
        reverse_name: String,
        callback: CompletionCallback,
    ) -> Self {
        Self {
            id,
            context_id,
            expires_at,
            expired: false,
            reverse_name,
            callback: Mutex::new(callback),
        }
    }

    /// Hands the outcome to the caller. Consumes the query, so a query that
    /// left the registry can complete only once.
    pub fn complete(self, outcome: LookupOutcome) {
        let callback = self.callback.into_inner().unwrap_or_else(|e| e.into_inner());
        callback(outcome)
    }
}

impl fmt::Debug for PendingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingQuery")
            .field("id", &self.id)
            .field("context_id", &self.context_id)
            .field("expires_at", &self.expires_at)
            .field("expired", &self.expired)
            .field("reverse_name", &self.reverse_name)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Inner {
    queries: FxHashMap<QueryId, PendingQuery>,
    by_expiry: BTreeSet<(Instant, QueryId)>,
    closed: bool,
}

impl Inner {
    fn insert(&mut self, query: PendingQuery) -> Result<(), BrokerError> {
        if self.queries.contains_key(&query.id) {
            return Err(BrokerError::DuplicateQueryId(query.id));
        }
        self.by_expiry.insert((query.expires_at, query.id));
        self.queries.insert(query.id, query);
        Ok(())
    }

    fn remove(&mut self, id: QueryId) -> Option<PendingQuery> {
        let query = self.queries.remove(&id)?;
        self.by_expiry.remove(&(query.expires_at, id));
        Some(query)
    }
}

/// Outstanding queries of one context, ordered by expiry.
///
/// Removal is the only way a query leaves the registry, and it happens under
/// the write lock: whichever of engine completion, timeout sweep or shutdown
/// drain removes a query first owns its callback.
pub struct QueryRegistry {
    context_id: ContextId,
    inner: RwLock<Inner>,
}

impl QueryRegistry {
    pub fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| {
            warn!(context_id = %self.context_id, "Query registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| {
            warn!(context_id = %self.context_id, "Query registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    pub fn register(&self, query: PendingQuery) -> Result<(), BrokerError> {
        let mut inner = self.write();
        if inner.closed {
            return Err(BrokerError::ContextClosed);
        }
        inner.insert(query)
    }

    /// Submits through `submit` and registers the resulting query in one
    /// critical section, so no completion can look the id up before it is
    /// tracked.
    ///
    /// `submit` must not complete the query synchronously.
    pub fn track<F>(
        &self,
        expires_at: Instant,
        reverse_name: String,
        callback: CompletionCallback,
        submit: F,
    ) -> Result<QueryId, BrokerError>
    where
        F: FnOnce(&str) -> Result<QueryId, BrokerError>,
    {
        let mut inner = self.write();
        if inner.closed {
            return Err(BrokerError::ContextClosed);
        }

        let id = submit(&reverse_name)?;
        inner.insert(PendingQuery::new(
            id,
            self.context_id,
            expires_at,
            reverse_name,
            callback,
        ))?;
        Ok(id)
    }

    pub fn unregister(&self, id: QueryId) -> Option<PendingQuery> {
        self.write().remove(id)
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.read().by_expiry.first().map(|(expires_at, _)| *expires_at)
    }

    /// Removes every query with `expires_at <= now`, earliest first.
    pub fn sweep_expired(&self, now: Instant) -> Vec<PendingQuery> {
        // common case: nothing expired, checked without blocking completions
        match self.next_expiry() {
            Some(earliest) if earliest <= now => {}
            _ => return Vec::new(),
        }

        let mut inner = self.write();
        let mut expired = Vec::new();
        while let Some(&(expires_at, id)) = inner.by_expiry.first() {
            if expires_at > now {
                break;
            }
            inner.by_expiry.pop_first();
            if let Some(mut query) = inner.queries.remove(&id) {
                query.expired = true;
                expired.push(query);
            }
        }
        expired
    }

    /// Removes every query and refuses further registrations.
    pub fn drain_all(&self) -> Vec<PendingQuery> {
        let mut inner = self.write();
        inner.closed = true;

        let order: Vec<QueryId> = inner.by_expiry.iter().map(|(_, id)| *id).collect();
        inner.by_expiry.clear();
        let mut drained = Vec::with_capacity(order.len());
        for id in order {
            if let Some(query) = inner.queries.remove(&id) {
                drained.push(query);
            }
        }
        drained
    }

    pub fn contains(&self, id: QueryId) -> bool {
        self.read().queries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }
}
