pub mod broker;
pub mod context;
pub mod context_registry;
pub mod lookup_future;
pub mod query_registry;
pub mod readiness;

pub use broker::Broker;
pub use context::{Context, POLL_INTERVAL};
pub use context_registry::ContextRegistry;
pub use lookup_future::LookupFuture;
pub use query_registry::{PendingQuery, QueryRegistry};
