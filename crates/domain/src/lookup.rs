use std::fmt;

/// Identifier of a resolver context, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Identifier the resolver engine assigns to a submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal result of a reverse lookup.
///
/// `Ok(Some(hostname))` when the engine returned PTR data, `Ok(None)` when the
/// name exists but carries no data (or does not exist), `Err` otherwise.
pub type LookupOutcome = Result<Option<String>, crate::BrokerError>;

/// Completion callback handed to the broker with every reverse lookup.
///
/// Invoked exactly once, never on the thread that issued the lookup.
pub type CompletionCallback = Box<dyn FnOnce(LookupOutcome) + Send + 'static>;
