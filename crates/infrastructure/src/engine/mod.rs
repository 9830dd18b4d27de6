//! UDP stub resolver behind the `ResolverEngine` port.

pub mod message_builder;
pub mod pending;
pub mod response_parser;
pub mod udp_engine;

pub use message_builder::MessageBuilder;
pub use response_parser::{PtrResponse, ResponseParser};
pub use udp_engine::UdpResolverEngine;

use crate::system::{HOSTS_PATH, RESOLV_CONF_PATH};
use ferrous_rdns_application::ports::{EngineError, EngineFactory, ResolverEngine};
use std::path::PathBuf;

/// Creates one unconfigured `UdpResolverEngine` per context.
#[derive(Debug, Clone)]
pub struct UdpEngineFactory {
    resolv_conf: PathBuf,
    hosts: PathBuf,
}

impl UdpEngineFactory {
    pub fn new() -> Self {
        Self::with_resolv_conf(RESOLV_CONF_PATH)
    }

    /// Reads system settings from `path` instead of `/etc/resolv.conf`.
    pub fn with_resolv_conf(path: impl Into<PathBuf>) -> Self {
        Self::with_system_files(path, HOSTS_PATH)
    }

    /// Both system files, for contexts that load the system configuration.
    pub fn with_system_files(resolv_conf: impl Into<PathBuf>, hosts: impl Into<PathBuf>) -> Self {
        Self {
            resolv_conf: resolv_conf.into(),
            hosts: hosts.into(),
        }
    }
}

impl Default for UdpEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for UdpEngineFactory {
    fn create_engine(&self) -> Result<Box<dyn ResolverEngine>, EngineError> {
        let engine = UdpResolverEngine::new(self.resolv_conf.clone()).with_hosts(self.hosts.clone());
        Ok(Box::new(engine))
    }
}
