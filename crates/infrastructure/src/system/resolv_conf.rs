use super::nameserver::{parse_nameserver, DNS_PORT};
use ferrous_rdns_domain::ConfigError;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, warn};

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Used when resolv.conf lists no nameserver, as the system resolver does.
pub const FALLBACK_NAMESERVER: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), DNS_PORT);

pub fn read_nameservers(path: &Path) -> Result<Vec<SocketAddr>, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;

    let mut nameservers = parse_nameservers(&contents);
    if nameservers.is_empty() {
        debug!(path = %path.display(), "No nameserver in resolv.conf, using localhost");
        nameservers.push(FALLBACK_NAMESERVER);
    }
    Ok(nameservers)
}

/// Collects `nameserver` lines. Entries that are not plain addresses (scoped
/// IPv6 addresses for instance) are skipped.
pub fn parse_nameservers(contents: &str) -> Vec<SocketAddr> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.starts_with('#') || line.starts_with(';') {
                return None;
            }
            let mut fields = line.split_whitespace();
            if fields.next() != Some("nameserver") {
                return None;
            }
            let value = fields.next()?;
            match parse_nameserver(value, DNS_PORT) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    warn!(error = %e, "Skipping resolv.conf nameserver");
                    None
                }
            }
        })
        .collect()
}
