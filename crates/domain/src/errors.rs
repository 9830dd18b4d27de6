use crate::lookup::{ContextId, QueryId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Failed to allocate memory for {0}")]
    AllocationFailure(&'static str),

    #[error("Could not create resolver engine: {0}")]
    EngineCreateFailed(String),

    #[error("Error loading resolver configuration: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to configure asynchronous behaviour on resolver engine: {0}")]
    AsyncModeUnsupported(String),

    #[error("Failed to create processing thread for context: {0}")]
    ThreadSpawnFailed(String),

    #[error("Failed to join processing thread: {0}")]
    ThreadJoinFailed(String),

    #[error("Invalid context id: {0}")]
    InvalidContextId(ContextId),

    #[error("Invalid IP address length: {0}")]
    InvalidAddressLength(usize),

    #[error("Resolve error: {0}")]
    ResolveSubmitFailed(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Resolver engine error: {0}")]
    EngineReportedError(String),

    #[error("Query id {0} is already tracked")]
    DuplicateQueryId(QueryId),

    #[error("Context closed before the query completed")]
    ContextClosed,

    #[error("Broker is not initialized")]
    NotInitialized,
}

impl BrokerError {
    /// True for failures delivered through a completion callback rather than
    /// returned from the call that issued the query.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            BrokerError::Timeout | BrokerError::EngineReportedError(_) | BrokerError::ContextClosed
        )
    }
}
