use clap::Parser;
use ferrous_rdns_application::Broker;
use ferrous_rdns_domain::CliOverrides;
use ferrous_rdns_infrastructure::UdpEngineFactory;
use futures::future::join_all;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{error, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "ferrous-rdns")]
#[command(version)]
#[command(about = "Ferrous rDNS - asynchronous reverse DNS lookups")]
struct Cli {
    /// Addresses to resolve (IPv4 or IPv6)
    #[arg(required = true, value_name = "ADDRESS")]
    addresses: Vec<IpAddr>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Engine configuration file (nameservers) instead of /etc/resolv.conf
    #[arg(short = 'e', long, value_name = "FILE")]
    engine_config: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        request_timeout_secs: cli.timeout,
        engine_config_path: cli.engine_config.clone(),
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting Ferrous rDNS v{}", Broker::version());

    let broker = Broker::init(Arc::new(UdpEngineFactory::new()));
    let context = broker.create_context(&config.context)?;

    let lookups = cli.addresses.iter().map(|ip| {
        let octets = match ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        broker.reverse_lookup_async(context, &octets)
    });
    let pending: Vec<_> = lookups.collect::<Result<_, _>>()?;
    let outcomes = join_all(pending).await;

    let mut failures = 0;
    for (ip, outcome) in cli.addresses.iter().zip(outcomes) {
        match outcome {
            Ok(Some(hostname)) => println!("{}\t{}", ip, hostname),
            Ok(None) => println!("{}\t-", ip),
            Err(e) => {
                failures += 1;
                error!(address = %ip, error = %e, "Reverse lookup failed");
                println!("{}\t! {}", ip, e);
            }
        }
    }

    broker.shutdown();
    info!("Broker shutdown complete");

    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, cli.addresses.len());
    }
    Ok(())
}
