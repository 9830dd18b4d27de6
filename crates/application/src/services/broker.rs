use super::context::Context;
use super::context_registry::ContextRegistry;
use super::lookup_future::LookupFuture;
use crate::ports::EngineFactory;
use ferrous_rdns_domain::{BrokerError, ContextConfig, ContextId, LookupOutcome};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument};

/// Public surface of the reverse DNS broker.
///
/// Owns every context it creates. Dropping the broker shuts it down.
pub struct Broker {
    factory: Arc<dyn EngineFactory>,
    contexts: ContextRegistry,
    // engine config loaders are not reentrant
    config_lock: Mutex<()>,
}

impl Broker {
    pub fn init(factory: Arc<dyn EngineFactory>) -> Self {
        info!(version = Self::version(), "Reverse DNS broker initialized");
        Self {
            factory,
            contexts: ContextRegistry::new(),
            config_lock: Mutex::new(()),
        }
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    #[instrument(skip(self, config), fields(timeout_ms = config.request_timeout().as_millis() as u64))]
    pub fn create_context(&self, config: &ContextConfig) -> Result<ContextId, BrokerError> {
        if self.contexts.is_closed() {
            return Err(BrokerError::NotInitialized);
        }

        let context = Arc::new(Context::create(
            self.factory.as_ref(),
            config,
            &self.config_lock,
        )?);
        let id = context.id();

        if let Err((e, context)) = self.contexts.insert(context) {
            // lost a race with shutdown
            if let Err(stop_err) = context.stop() {
                error!(context_id = %id, error = %stop_err, "Failed to stop rejected context");
            }
            return Err(e);
        }
        Ok(id)
    }

    /// Stops a context, completing its outstanding queries with
    /// `ContextClosed`. Unknown ids are not an error.
    ///
    /// From inside a completion callback the context's thread is only
    /// signalled, so its queries complete shortly after this returns.
    #[instrument(skip(self))]
    pub fn delete_context(&self, id: ContextId) -> Result<(), BrokerError> {
        let Some(context) = self.contexts.remove(id) else {
            debug!(context_id = %id, "Context already deleted");
            return Ok(());
        };

        context.stop()?;
        info!(context_id = %id, "Resolver context deleted");
        Ok(())
    }

    /// Issues a reverse lookup of a raw 4 or 16 byte address.
    ///
    /// Only validation and submission failures are returned here. Everything
    /// after submission reaches `callback`, exactly once and on the context's
    /// processing thread.
    pub fn reverse_lookup<F>(
        &self,
        id: ContextId,
        address: &[u8],
        callback: F,
    ) -> Result<(), BrokerError>
    where
        F: FnOnce(LookupOutcome) + Send + 'static,
    {
        let context = self.context(id)?;
        context.reverse_lookup(address, Box::new(callback))?;
        Ok(())
    }

    pub fn reverse_lookup_ip<F>(&self, id: ContextId, ip: IpAddr, callback: F) -> Result<(), BrokerError>
    where
        F: FnOnce(LookupOutcome) + Send + 'static,
    {
        match ip {
            IpAddr::V4(v4) => self.reverse_lookup(id, &v4.octets(), callback),
            IpAddr::V6(v6) => self.reverse_lookup(id, &v6.octets(), callback),
        }
    }

    /// Same as [`Broker::reverse_lookup`], with the outcome delivered through
    /// a future instead of a callback.
    pub fn reverse_lookup_async(
        &self,
        id: ContextId,
        address: &[u8],
    ) -> Result<LookupFuture, BrokerError> {
        let (tx, future) = LookupFuture::channel();
        self.reverse_lookup(id, address, move |outcome| {
            // the caller may have stopped waiting
            let _ = tx.send(outcome);
        })?;
        Ok(future)
    }

    pub fn context_ids(&self) -> Vec<ContextId> {
        self.contexts.ids()
    }

    pub fn outstanding_queries(&self, id: ContextId) -> Result<usize, BrokerError> {
        Ok(self.context(id)?.outstanding())
    }

    /// Deletes every context. Outstanding queries are completed before this
    /// returns, except those of a context whose own callback called it.
    pub fn shutdown(&self) {
        let contexts = self.contexts.drain();
        if contexts.is_empty() {
            return;
        }
        info!(contexts = contexts.len(), "Shutting down reverse DNS broker");

        // every thread starts winding down before the first join
        for context in &contexts {
            context.signal_stop();
        }
        for context in contexts {
            if let Err(e) = context.stop() {
                error!(context_id = %context.id(), error = %e, "Failed to delete context during shutdown");
            }
        }
        info!("Reverse DNS broker shut down");
    }

    fn context(&self, id: ContextId) -> Result<Arc<Context>, BrokerError> {
        match self.contexts.get(id) {
            Some(context) => Ok(context),
            None if self.contexts.is_closed() => Err(BrokerError::NotInitialized),
            None => Err(BrokerError::InvalidContextId(id)),
        }
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
