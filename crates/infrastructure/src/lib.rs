//! Ferrous rDNS Infrastructure Layer
pub mod engine;
pub mod system;

pub use engine::{UdpEngineFactory, UdpResolverEngine};
