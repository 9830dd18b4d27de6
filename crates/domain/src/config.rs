pub mod context;
pub mod errors;
pub mod logging;
pub mod root;

pub use context::{ContextConfig, MAX_REQUEST_TIMEOUT};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{BrokerConfig, CliOverrides};
