#![allow(dead_code)]

pub mod mock_engine;

pub use mock_engine::*;

use ferrous_rdns_application::Broker;
use ferrous_rdns_domain::{ContextConfig, LookupOutcome};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Long enough for any answer the mock engine schedules.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn broker_with(control: &Arc<MockControl>) -> Broker {
    Broker::init(MockEngineFactory::new(Arc::clone(control)))
}

pub fn short_timeout(millis: u64) -> ContextConfig {
    ContextConfig::default().with_request_timeout(Duration::from_millis(millis))
}

/// Completion callback that forwards its outcome into a channel.
pub fn recorder() -> (
    impl FnOnce(LookupOutcome) + Send + 'static,
    mpsc::Receiver<LookupOutcome>,
) {
    let (tx, rx) = mpsc::channel();
    (
        move |outcome| {
            let _ = tx.send(outcome);
        },
        rx,
    )
}
