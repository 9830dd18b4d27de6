use ferrous_rdns_domain::{BrokerConfig, CliOverrides};

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<BrokerConfig> {
    BrokerConfig::load(path, overrides)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
