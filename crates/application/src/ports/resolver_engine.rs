use ferrous_rdns_domain::{QueryId, RecordType};
use std::os::fd::RawFd;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Create(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Async(String),

    #[error("{0}")]
    Submit(String),

    #[error("{0}")]
    Process(String),

    /// Failure reported for one query after it was submitted.
    #[error("{0}")]
    Resolve(String),
}

/// Answer the engine produced for one PTR query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAnswer {
    pub qname: String,
    pub qtype: RecordType,
    pub rcode: u16,
    /// Rdata of each answer record in uncompressed wire form.
    pub rdata: Vec<Vec<u8>>,
}

impl EngineAnswer {
    pub fn no_data(qname: impl Into<String>, rcode: u16) -> Self {
        Self {
            qname: qname.into(),
            qtype: RecordType::PTR,
            rcode,
            rdata: Vec::new(),
        }
    }

    pub fn have_data(&self) -> bool {
        !self.rdata.is_empty()
    }

    pub fn is_nxdomain(&self) -> bool {
        self.rcode == 3
    }
}

pub type EngineResult = Result<EngineAnswer, EngineError>;

/// Invoked once per query that is neither cancelled nor still pending.
pub type EngineCallback = Box<dyn FnOnce(QueryId, EngineResult) + Send + 'static>;

/// Asynchronous resolution engine driven by a context's processing thread.
///
/// Configuration methods run once, before the engine is shared. After that
/// `submit_ptr` and `cancel` may be called from any thread while
/// `process_pending` is only ever called from the owning processing thread.
///
/// Callbacks run inside `process_pending`, never inside `submit_ptr`, and
/// with no engine lock held: a callback may call back into `cancel` or
/// `submit_ptr`.
pub trait ResolverEngine: Send + Sync {
    /// Loads the platform resolver settings.
    fn load_system_config(&mut self) -> Result<(), EngineError>;

    /// Loads an engine configuration file. Not reentrant across engines.
    fn load_config_file(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Switches the engine to asynchronous operation.
    fn enable_async(&mut self) -> Result<(), EngineError>;

    /// Descriptor that becomes readable when `process_pending` has work.
    fn pollable_fd(&self) -> Result<RawFd, EngineError>;

    fn submit_ptr(&self, name: &str, callback: EngineCallback) -> Result<QueryId, EngineError>;

    /// Forgets a query; its callback will not be invoked afterwards.
    fn cancel(&self, id: QueryId);

    fn process_pending(&self) -> Result<(), EngineError>;
}

pub trait EngineFactory: Send + Sync {
    fn create_engine(&self) -> Result<Box<dyn ResolverEngine>, EngineError>;
}
