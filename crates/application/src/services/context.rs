use super::query_registry::{PendingQuery, QueryRegistry};
use super::readiness::wait_readable;
use crate::ports::{EngineFactory, EngineResult, ResolverEngine};
use ferrous_rdns_domain::{
    describe_address, rdata_to_hostname, reverse_name_from_bytes, BrokerError, CompletionCallback,
    ContextConfig, ContextId, EngineSource, QueryId, MAX_REQUEST_TIMEOUT,
};
use std::cell::Cell;
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Longest the processing thread blocks before re-checking timeouts and the
/// stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static ON_PROCESSING_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True on any context's processing thread, i.e. inside a completion callback.
fn on_processing_thread() -> bool {
    ON_PROCESSING_THREAD.with(Cell::get)
}

fn next_context_id() -> ContextId {
    ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// One resolver engine, the thread that drives it and the queries issued
/// through it.
pub struct Context {
    id: ContextId,
    engine: Arc<dyn ResolverEngine>,
    request_timeout: Duration,
    queries: Arc<QueryRegistry>,
    stopping: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Context {
    /// Builds and configures an engine, then starts the processing thread.
    ///
    /// Every failure drops whatever was built so far, so no engine outlives a
    /// failed call.
    pub fn create(
        factory: &dyn EngineFactory,
        config: &ContextConfig,
        config_lock: &Mutex<()>,
    ) -> Result<Self, BrokerError> {
        let mut engine = factory
            .create_engine()
            .map_err(|e| BrokerError::EngineCreateFailed(e.to_string()))?;

        match config.engine_source() {
            EngineSource::System => engine
                .load_system_config()
                .map_err(|e| BrokerError::ConfigLoadFailed(e.to_string()))?,
            EngineSource::File(path) => {
                let _guard = config_lock.lock().unwrap_or_else(|e| {
                    warn!("Engine config lock poisoned, recovering");
                    e.into_inner()
                });
                engine
                    .load_config_file(Path::new(path))
                    .map_err(|e| BrokerError::ConfigLoadFailed(format!("{}: {}", path, e)))?;
            }
            EngineSource::Defaults => {}
        }

        engine
            .enable_async()
            .map_err(|e| BrokerError::AsyncModeUnsupported(e.to_string()))?;
        let fd = engine
            .pollable_fd()
            .map_err(|e| BrokerError::AsyncModeUnsupported(e.to_string()))?;

        let id = next_context_id();
        let engine: Arc<dyn ResolverEngine> = Arc::from(engine);
        let queries = Arc::new(QueryRegistry::new(id));
        let stopping = Arc::new(AtomicBool::new(false));

        let processing = ProcessingLoop {
            context_id: id,
            engine: Arc::clone(&engine),
            fd,
            queries: Arc::clone(&queries),
            stopping: Arc::clone(&stopping),
        };
        let handle = thread::Builder::new()
            .name(format!("rdns-ctx-{}", id))
            .spawn(move || processing.run())
            .map_err(|e| BrokerError::ThreadSpawnFailed(e.to_string()))?;

        info!(
            context_id = %id,
            timeout_ms = config.request_timeout().as_millis() as u64,
            "Resolver context created"
        );

        Ok(Self {
            id,
            engine,
            request_timeout: config.request_timeout(),
            queries,
            stopping,
            thread: Mutex::new(Some(handle)),
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn outstanding(&self) -> usize {
        self.queries.len()
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Submits a PTR query for `address` (4 or 16 bytes).
    ///
    /// The callback runs on the processing thread with the hostname, `None`
    /// when the engine had no data, or the error that ended the query.
    pub fn reverse_lookup(
        &self,
        address: &[u8],
        callback: CompletionCallback,
    ) -> Result<QueryId, BrokerError> {
        let reverse_name = reverse_name_from_bytes(address)?;
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.request_timeout)
            .or_else(|| now.checked_add(MAX_REQUEST_TIMEOUT))
            .unwrap_or(now);

        let queries = Arc::clone(&self.queries);
        let id = self
            .queries
            .track(expires_at, reverse_name, callback, |name| {
                self.engine
                    .submit_ptr(
                        name,
                        Box::new(move |query_id: QueryId, result: EngineResult| {
                            complete_from_engine(&queries, query_id, result)
                        }),
                    )
                    .map_err(|e| BrokerError::ResolveSubmitFailed(e.to_string()))
            })
            .inspect_err(|e| {
                if let BrokerError::DuplicateQueryId(query_id) = e {
                    error!(context_id = %self.id, query_id = %query_id, "Engine reused a tracked query id");
                }
            })?;

        debug!(
            context_id = %self.id,
            query_id = %id,
            address = %describe_address(address),
            "Reverse lookup submitted"
        );
        Ok(id)
    }

    /// Raises the stop flag without waiting for the thread.
    pub fn signal_stop(&self) {
        self.stopping.store(true, Ordering::Release);
    }

    /// Stops the processing thread and completes every outstanding query with
    /// `ContextClosed`. Safe to call more than once.
    ///
    /// Called from any processing thread (a completion callback deleting its
    /// own or another context), the thread is detached and finishes on its
    /// own: it drains its queries once it sees the stop flag. Joining there
    /// could deadlock two contexts deleting each other.
    pub fn stop(&self) -> Result<(), BrokerError> {
        self.signal_stop();

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        if on_processing_thread() {
            debug!(context_id = %self.id, "Context stopped from a processing thread, detaching");
            return Ok(());
        }

        let joined = handle.join();
        // a thread that died early leaves its queries behind
        drain_outstanding(self.engine.as_ref(), &self.queries);

        joined.map_err(|_| {
            BrokerError::ThreadJoinFailed(format!("processing thread of context {} panicked", self.id))
        })?;
        info!(context_id = %self.id, "Resolver context stopped");
        Ok(())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(context_id = %self.id, error = %e, "Failed to stop context on drop");
        }
    }
}

/// Engine-driven completion. Losing the race against a timeout sweep or a
/// drain is not an error: the query is simply gone.
fn complete_from_engine(queries: &QueryRegistry, query_id: QueryId, result: EngineResult) {
    let Some(query) = queries.unregister(query_id) else {
        debug!(query_id = %query_id, "Engine answered a query that already completed");
        return;
    };

    let outcome = match result {
        Ok(answer) => {
            let hostname = answer
                .rdata
                .first()
                .map(|rdata| rdata_to_hostname(rdata, answer.qtype));
            debug!(
                query_id = %query_id,
                reverse_name = %query.reverse_name,
                rcode = answer.rcode,
                hostname = hostname.as_deref().unwrap_or("-"),
                "Reverse lookup answered"
            );
            Ok(hostname)
        }
        Err(e) => {
            debug!(query_id = %query_id, error = %e, "Reverse lookup failed");
            Err(BrokerError::EngineReportedError(e.to_string()))
        }
    };
    query.complete(outcome);
}

fn expire(engine: &dyn ResolverEngine, query: PendingQuery) {
    engine.cancel(query.id);
    debug!(
        context_id = %query.context_id,
        query_id = %query.id,
        reverse_name = %query.reverse_name,
        "Reverse lookup timed out"
    );
    query.complete(Err(BrokerError::Timeout));
}

fn drain_outstanding(engine: &dyn ResolverEngine, queries: &QueryRegistry) {
    for query in queries.drain_all() {
        engine.cancel(query.id);
        debug!(query_id = %query.id, "Completing query of a closed context");
        query.complete(Err(BrokerError::ContextClosed));
    }
}

/// State the processing thread shares with its context. It never disposes of
/// anything; the engine goes away when the last owner drops it.
struct ProcessingLoop {
    context_id: ContextId,
    engine: Arc<dyn ResolverEngine>,
    fd: RawFd,
    queries: Arc<QueryRegistry>,
    stopping: Arc<AtomicBool>,
}

impl ProcessingLoop {
    fn run(self) {
        ON_PROCESSING_THREAD.with(|flag| flag.set(true));
        debug!(context_id = %self.context_id, "Processing thread started");

        while !self.stopping.load(Ordering::Acquire) {
            match wait_readable(self.fd, POLL_INTERVAL) {
                Ok(true) => {
                    if let Err(e) = self.engine.process_pending() {
                        warn!(context_id = %self.context_id, error = %e, "Engine failed to process pending queries");
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(context_id = %self.context_id, error = %e, "Polling engine descriptor failed");
                    thread::sleep(POLL_INTERVAL);
                }
            }

            for query in self.queries.sweep_expired(Instant::now()) {
                expire(self.engine.as_ref(), query);
            }
        }

        drain_outstanding(self.engine.as_ref(), &self.queries);
        debug!(context_id = %self.context_id, "Processing thread exited");
    }
}
