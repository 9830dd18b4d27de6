use super::nameserver::{parse_nameserver, DNS_PORT};
use ferrous_rdns_domain::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Engine configuration file.
///
/// ```toml
/// nameservers = ["1.1.1.1", "9.9.9.9:53", "[2606:4700:4700::1111]:53"]
/// port = 53
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineFileConfig {
    #[serde(default)]
    pub nameservers: Vec<String>,

    /// Port for nameservers listed without one.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl EngineFileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn nameserver_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        if self.nameservers.is_empty() {
            return Err(ConfigError::Validation(
                "engine configuration lists no nameservers".to_string(),
            ));
        }
        self.nameservers
            .iter()
            .map(|ns| parse_nameserver(ns, self.port))
            .collect()
    }
}

fn default_port() -> u16 {
    DNS_PORT
}
