//! Ferrous rDNS Application Layer
pub mod ports;
pub mod services;

pub use services::{Broker, LookupFuture};
