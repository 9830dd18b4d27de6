//! Ferrous rDNS Domain Layer
pub mod config;
pub mod errors;
pub mod lookup;
pub mod record_type;
pub mod reverse_name;
pub mod wire;

pub use config::{
    BrokerConfig, CliOverrides, ConfigError, ContextConfig, LoggingConfig, MAX_REQUEST_TIMEOUT,
};
pub use config::context::EngineSource;
pub use errors::BrokerError;
pub use lookup::{CompletionCallback, ContextId, LookupOutcome, QueryId};
pub use record_type::RecordType;
pub use reverse_name::{
    address_from_reverse_name, describe_address, reverse_name, reverse_name_from_bytes,
    reverse_name_v4, reverse_name_v6,
};
pub use wire::{rdata_to_hostname, rdata_to_text, DecodedText};
