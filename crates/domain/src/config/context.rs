use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the request timeout. Longer values are rejected by
/// validation and clamped by [`ContextConfig::request_timeout`].
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings applied to one resolver context at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContextConfig {
    /// Configure the engine from the platform resolver settings
    /// (`/etc/resolv.conf`). Takes precedence over `engine_config_path`.
    #[serde(default = "default_true")]
    pub use_system_resolver: bool,

    /// Engine configuration file, read when `use_system_resolver` is off.
    #[serde(default)]
    pub engine_config_path: Option<String>,

    /// Time a query may stay outstanding before it completes with a timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sub-second override of `request_timeout_secs`, never serialized.
    #[serde(skip)]
    request_timeout_override: Option<Duration>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            use_system_resolver: true,
            engine_config_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            request_timeout_override: None,
        }
    }
}

impl ContextConfig {
    pub fn with_system_resolver() -> Self {
        Self::default()
    }

    pub fn with_engine_config(path: impl Into<String>) -> Self {
        Self {
            use_system_resolver: false,
            engine_config_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self.request_timeout_override = Some(timeout);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_override
            .unwrap_or_else(|| Duration::from_secs(self.request_timeout_secs))
            .min(MAX_REQUEST_TIMEOUT)
    }

    /// Which configuration source the engine is loaded from.
    pub fn engine_source(&self) -> EngineSource<'_> {
        if self.use_system_resolver {
            EngineSource::System
        } else if let Some(path) = self.engine_config_path.as_deref() {
            EngineSource::File(path)
        } else {
            EngineSource::Defaults
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSource<'a> {
    System,
    File(&'a str),
    Defaults,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    5
}
