pub mod engine_config;
pub mod hosts;
pub mod nameserver;
pub mod resolv_conf;

pub use engine_config::EngineFileConfig;
pub use hosts::{read_hosts, HOSTS_PATH};
pub use nameserver::{parse_nameserver, DNS_PORT};
pub use resolv_conf::{read_nameservers, RESOLV_CONF_PATH};
