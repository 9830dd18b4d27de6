use ferrous_rdns_application::ports::EngineCallback;
use ferrous_rdns_domain::QueryId;
use rustc_hash::FxHashMap;
use std::net::SocketAddr;

/// Random transaction ids tried before falling back to a scan.
const RANDOM_ID_ATTEMPTS: usize = 16;

/// A query sent to a nameserver and not answered yet.
pub struct InFlight {
    pub query_id: QueryId,
    pub server: SocketAddr,
    pub qname: String,
    pub callback: EngineCallback,
}

/// In-flight queries keyed by DNS transaction id, with a reverse index from
/// engine query id for cancellation.
#[derive(Default)]
pub struct InFlightTable {
    by_txid: FxHashMap<u16, InFlight>,
    txid_of: FxHashMap<QueryId, u16>,
}

impl InFlightTable {
    /// Picks a transaction id not used by any in-flight query.
    pub fn free_txid(&self) -> Option<u16> {
        for _ in 0..RANDOM_ID_ATTEMPTS {
            let candidate = fastrand::u16(..);
            if !self.by_txid.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        (0..=u16::MAX).find(|candidate| !self.by_txid.contains_key(candidate))
    }

    pub fn insert(&mut self, txid: u16, in_flight: InFlight) {
        self.txid_of.insert(in_flight.query_id, txid);
        self.by_txid.insert(txid, in_flight);
    }

    /// Removes the query waiting on `txid` if `accept` agrees it is the one
    /// answered. A datagram that fails the check leaves the query in place.
    pub fn take_if(&mut self, txid: u16, accept: impl FnOnce(&InFlight) -> bool) -> Option<InFlight> {
        if !accept(self.by_txid.get(&txid)?) {
            return None;
        }
        let in_flight = self.by_txid.remove(&txid)?;
        self.txid_of.remove(&in_flight.query_id);
        Some(in_flight)
    }

    pub fn cancel(&mut self, query_id: QueryId) -> Option<InFlight> {
        let txid = self.txid_of.remove(&query_id)?;
        self.by_txid.remove(&txid)
    }

    pub fn len(&self) -> usize {
        self.by_txid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_txid.is_empty()
    }
}
