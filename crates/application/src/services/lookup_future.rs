use ferrous_rdns_domain::{BrokerError, LookupOutcome};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Resolves to the outcome of one reverse lookup.
///
/// Completes with `ContextClosed` if the lookup was dropped without ever
/// being completed.
#[must_use = "futures do nothing unless awaited"]
#[derive(Debug)]
pub struct LookupFuture {
    rx: oneshot::Receiver<LookupOutcome>,
}

impl LookupFuture {
    pub(crate) fn channel() -> (oneshot::Sender<LookupOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for LookupFuture {
    type Output = LookupOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BrokerError::ContextClosed)))
    }
}
