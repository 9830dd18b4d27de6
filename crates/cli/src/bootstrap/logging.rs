use ferrous_rdns_domain::LoggingConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` directives are kept and the
/// configured level is added on top.
pub fn init_logging(config: &LoggingConfig) {
    let level = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Results go to stdout, so logs stay on stderr.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
