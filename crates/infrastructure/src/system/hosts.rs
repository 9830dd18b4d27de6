use ferrous_rdns_domain::ConfigError;
use rustc_hash::FxHashMap;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;

pub const HOSTS_PATH: &str = "/etc/hosts";

/// Reads the static address table. A missing file is an empty table.
pub fn read_hosts(path: &Path) -> Result<FxHashMap<IpAddr, String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_hosts(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No hosts file, nothing answered locally");
            Ok(FxHashMap::default())
        }
        Err(e) => Err(ConfigError::FileRead(path.display().to_string(), e.to_string())),
    }
}

/// Maps each address to the canonical name of the first line listing it.
///
/// Scoped IPv6 addresses (`fe80::1%eth0`) are skipped.
pub fn parse_hosts(contents: &str) -> FxHashMap<IpAddr, String> {
    let mut hosts = FxHashMap::default();
    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Ok(ip) = addr.parse::<IpAddr>() else {
            continue;
        };
        hosts.entry(ip).or_insert_with(|| name.to_string());
    }
    hosts
}
