use ferrous_rdns_domain::ConfigError;
use std::net::{IpAddr, SocketAddr};

pub const DNS_PORT: u16 = 53;

/// Parses `1.1.1.1`, `1.1.1.1:5353`, `2606:4700::1111` or `[::1]:5353`.
/// Bare addresses get `default_port`.
pub fn parse_nameserver(value: &str, default_port: u16) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, default_port))
        .map_err(|e| ConfigError::InvalidNameserver(value.to_string(), e.to_string()))
}
