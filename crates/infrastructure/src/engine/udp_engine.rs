use super::message_builder::MessageBuilder;
use super::pending::{InFlight, InFlightTable};
use super::response_parser::ResponseParser;
use crate::system::resolv_conf::FALLBACK_NAMESERVER;
use crate::system::{read_hosts, read_nameservers, EngineFileConfig, HOSTS_PATH};
use ferrous_rdns_application::ports::{
    EngineAnswer, EngineCallback, EngineError, EngineResult, ResolverEngine,
};
use ferrous_rdns_domain::{reverse_name, QueryId, RecordType};
use rustc_hash::FxHashMap;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Largest datagram read; answers that do not fit come back truncated.
const MAX_DATAGRAM: usize = 4096;

type Completion = (QueryId, EngineCallback, EngineResult);

/// Query answered from the hosts file, waiting for `process_pending`.
struct LocalAnswer {
    query_id: QueryId,
    qname: String,
    rdata: Vec<u8>,
    callback: EngineCallback,
}

/// Stub resolver sending PTR queries over one non-blocking UDP socket.
///
/// Nothing happens in the background: datagrams are only read, and callbacks
/// only run, inside `process_pending`. Addresses listed in the hosts file are
/// answered without touching the network.
pub struct UdpResolverEngine {
    resolv_conf: PathBuf,
    hosts_path: PathBuf,
    /// Reverse name (lowercase, no trailing dot) to PTR rdata.
    hosts: FxHashMap<String, Vec<u8>>,
    local_answers: Mutex<Vec<LocalAnswer>>,
    nameservers: Vec<SocketAddr>,
    socket: Option<UdpSocket>,
    /// Nameservers as addressed through `socket` (v4-mapped on a dual-stack socket).
    targets: Vec<SocketAddr>,
    in_flight: Mutex<InFlightTable>,
    next_query_id: AtomicU64,
    next_target: AtomicUsize,
}

impl UdpResolverEngine {
    pub fn new(resolv_conf: impl Into<PathBuf>) -> Self {
        Self {
            resolv_conf: resolv_conf.into(),
            hosts_path: PathBuf::from(HOSTS_PATH),
            hosts: FxHashMap::default(),
            local_answers: Mutex::new(Vec::new()),
            nameservers: Vec::new(),
            socket: None,
            targets: Vec::new(),
            in_flight: Mutex::new(InFlightTable::default()),
            next_query_id: AtomicU64::new(1),
            next_target: AtomicUsize::new(0),
        }
    }

    /// Reads static entries from `path` instead of `/etc/hosts`.
    pub fn with_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_path = path.into();
        self
    }

    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, InFlightTable> {
        self.in_flight.lock().unwrap_or_else(|e| {
            warn!("In-flight table lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn lock_local_answers(&self) -> MutexGuard<'_, Vec<LocalAnswer>> {
        self.local_answers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load_hosts(&mut self) -> Result<(), EngineError> {
        let entries = read_hosts(&self.hosts_path).map_err(|e| EngineError::Config(e.to_string()))?;
        self.hosts = entries
            .into_iter()
            .filter_map(|(ip, name)| match MessageBuilder::build_ptr_rdata(&name) {
                Ok(rdata) => Some((reverse_name(&ip), rdata)),
                Err(e) => {
                    warn!(address = %ip, error = %e, "Skipping hosts entry");
                    None
                }
            })
            .collect();
        debug!(path = %self.hosts_path.display(), entries = self.hosts.len(), "Loaded hosts file");
        Ok(())
    }

    /// Makes the socket readable so the processing thread picks up local answers.
    fn wake(&self, socket: &UdpSocket) {
        let Ok(local) = socket.local_addr() else {
            return;
        };
        let loopback = match local.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        if let Err(e) = socket.send_to(&[], SocketAddr::new(loopback, local.port())) {
            warn!(error = %e, "Failed to wake processing thread");
        }
    }

    fn socket(&self) -> Result<&UdpSocket, EngineError> {
        self.socket
            .as_ref()
            .ok_or_else(|| EngineError::Async("engine is not in asynchronous mode".to_string()))
    }

    fn create_socket(dual_stack: bool) -> std::io::Result<UdpSocket> {
        let domain = if dual_stack { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

        let bind_addr = if dual_stack {
            socket.set_only_v6(false)?;
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        };

        socket.bind(&bind_addr.into())?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }

    /// Matches one datagram against the in-flight table.
    fn take_completion(&self, datagram: &[u8], from: SocketAddr) -> Option<Completion> {
        let parsed = ResponseParser::parse(datagram);
        let txid = match &parsed {
            Ok(response) if !response.is_response => {
                warn!(from = %from, "Ignoring DNS message that is not a response");
                return None;
            }
            Ok(response) => response.id,
            Err(_) if datagram.len() >= 2 => u16::from_be_bytes([datagram[0], datagram[1]]),
            Err(e) => {
                warn!(from = %from, error = %e, "Ignoring runt datagram");
                return None;
            }
        };
        let question = parsed.as_ref().ok().and_then(|r| r.question.as_deref());
        let from = canonical(from);

        let in_flight = self.lock_in_flight().take_if(txid, |q| {
            canonical(q.server) == from && question.map_or(true, |name| same_name(name, &q.qname))
        });
        let Some(in_flight) = in_flight else {
            warn!(from = %from, txid, "Dropping response that matches no query");
            return None;
        };

        let result = match parsed {
            Ok(response) if response.truncated => {
                Err(EngineError::Resolve("truncated response".to_string()))
            }
            Ok(response) => {
                if response.is_server_error() {
                    debug!(
                        query_id = %in_flight.query_id,
                        server = %in_flight.server,
                        rcode = ResponseParser::rcode_to_status(response.rcode),
                        "Nameserver could not answer, reporting no data"
                    );
                }
                Ok(EngineAnswer {
                    qname: in_flight.qname,
                    qtype: response
                        .question_type
                        .and_then(RecordType::from_u16)
                        .unwrap_or(RecordType::PTR),
                    rcode: u16::from(response.rcode),
                    rdata: response.ptr_rdata,
                })
            }
            Err(e) => Err(e),
        };
        Some((in_flight.query_id, in_flight.callback, result))
    }
}

impl ResolverEngine for UdpResolverEngine {
    fn load_system_config(&mut self) -> Result<(), EngineError> {
        self.nameservers = read_nameservers(&self.resolv_conf)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        self.load_hosts()?;
        debug!(nameservers = ?self.nameservers, "Loaded system resolver configuration");
        Ok(())
    }

    fn load_config_file(&mut self, path: &Path) -> Result<(), EngineError> {
        self.nameservers = EngineFileConfig::from_file(path)
            .and_then(|config| config.nameserver_addrs())
            .map_err(|e| EngineError::Config(e.to_string()))?;
        debug!(path = %path.display(), nameservers = ?self.nameservers, "Loaded engine configuration file");
        Ok(())
    }

    fn enable_async(&mut self) -> Result<(), EngineError> {
        if self.socket.is_some() {
            return Ok(());
        }
        if self.nameservers.is_empty() {
            self.nameservers.push(FALLBACK_NAMESERVER);
        }

        let dual_stack = self.nameservers.iter().any(SocketAddr::is_ipv6);
        let socket = Self::create_socket(dual_stack)
            .map_err(|e| EngineError::Async(format!("Failed to bind UDP socket: {}", e)))?;

        self.targets = self
            .nameservers
            .iter()
            .map(|ns| match (dual_stack, ns.ip()) {
                (true, IpAddr::V4(v4)) => SocketAddr::new(IpAddr::V6(v4.to_ipv6_mapped()), ns.port()),
                _ => *ns,
            })
            .collect();

        info!(
            local = ?socket.local_addr().ok(),
            nameservers = self.nameservers.len(),
            dual_stack,
            "UDP resolver engine ready"
        );
        self.socket = Some(socket);
        Ok(())
    }

    fn pollable_fd(&self) -> Result<RawFd, EngineError> {
        Ok(self.socket()?.as_raw_fd())
    }

    fn submit_ptr(&self, name: &str, callback: EngineCallback) -> Result<QueryId, EngineError> {
        let socket = self.socket().map_err(|e| EngineError::Submit(e.to_string()))?;

        let key = name.trim_end_matches('.').to_ascii_lowercase();
        if let Some(rdata) = self.hosts.get(&key) {
            let query_id = QueryId(self.next_query_id.fetch_add(1, Ordering::Relaxed));
            self.lock_local_answers().push(LocalAnswer {
                query_id,
                qname: name.to_string(),
                rdata: rdata.clone(),
                callback,
            });
            self.wake(socket);
            debug!(query_id = %query_id, name, "PTR query answered from hosts file");
            return Ok(query_id);
        }

        if self.targets.is_empty() {
            return Err(EngineError::Submit("no nameservers configured".to_string()));
        }
        let server = self.targets[self.next_target.fetch_add(1, Ordering::Relaxed) % self.targets.len()];

        let mut table = self.lock_in_flight();
        let txid = table
            .free_txid()
            .ok_or_else(|| EngineError::Submit("too many queries in flight".to_string()))?;
        let packet = MessageBuilder::build_ptr_query(name, txid)?;

        socket
            .send_to(&packet, server)
            .map_err(|e| EngineError::Submit(format!("Failed to send query to {}: {}", server, e)))?;

        let query_id = QueryId(self.next_query_id.fetch_add(1, Ordering::Relaxed));
        table.insert(
            txid,
            InFlight {
                query_id,
                server,
                qname: name.to_string(),
                callback,
            },
        );
        debug!(query_id = %query_id, txid, server = %server, name, "PTR query sent");
        Ok(query_id)
    }

    fn cancel(&self, id: QueryId) {
        let mut local = self.lock_local_answers();
        let queued = local.len();
        local.retain(|answer| answer.query_id != id);
        let was_local = local.len() != queued;
        drop(local);

        if was_local || self.lock_in_flight().cancel(id).is_some() {
            debug!(query_id = %id, "Query cancelled");
        }
    }

    fn process_pending(&self) -> Result<(), EngineError> {
        let socket = self.socket().map_err(|e| EngineError::Process(e.to_string()))?;
        let mut buf = [0u8; MAX_DATAGRAM];
        let mut completed: Vec<Completion> = self
            .lock_local_answers()
            .drain(..)
            .map(|local| {
                let answer = EngineAnswer {
                    qname: local.qname,
                    qtype: RecordType::PTR,
                    rcode: 0,
                    rdata: vec![local.rdata],
                };
                (local.query_id, local.callback, Ok(answer))
            })
            .collect();
        let mut failure = None;

        loop {
            match socket.recv_from(&mut buf) {
                // wake-up datagram, DNS messages are never empty
                Ok((0, _)) => continue,
                Ok((len, from)) => {
                    if let Some(completion) = self.take_completion(&buf[..len], from) {
                        completed.push(completion);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    failure = Some(EngineError::Process(format!("Failed to read from socket: {}", e)));
                    break;
                }
            }
        }

        for (query_id, callback, result) in completed {
            callback(query_id, result);
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for UdpResolverEngine {
    fn drop(&mut self) {
        let abandoned = self.in_flight();
        if abandoned > 0 {
            debug!(abandoned, "UDP resolver engine dropped with queries in flight");
        }
    }
}

fn canonical(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_ignores_case_and_root() {
        assert!(same_name("1.0.0.127.IN-ADDR.ARPA.", "1.0.0.127.in-addr.arpa"));
        assert!(!same_name("2.0.0.127.in-addr.arpa", "1.0.0.127.in-addr.arpa"));
    }

    #[test]
    fn test_canonical_unmaps_ipv4() {
        let mapped: SocketAddr = "[::ffff:127.0.0.1]:53".parse().unwrap();
        assert_eq!(canonical(mapped), "127.0.0.1:53".parse().unwrap());
    }

    #[test]
    fn test_submit_requires_async_mode() {
        let engine = UdpResolverEngine::new("/nonexistent");
        let result = engine.submit_ptr("1.0.0.127.in-addr.arpa", Box::new(|_, _| {}));
        assert!(matches!(result, Err(EngineError::Submit(_))));
        assert!(matches!(engine.pollable_fd(), Err(EngineError::Async(_))));
    }

    #[test]
    fn test_defaults_to_localhost() {
        let mut engine = UdpResolverEngine::new("/nonexistent");
        engine.enable_async().unwrap();
        assert_eq!(engine.nameservers(), &[FALLBACK_NAMESERVER]);
        assert!(engine.local_addr().unwrap().is_ipv4());
    }

    #[test]
    fn test_hosts_entry_is_answered_without_nameserver() {
        let mut hosts = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut hosts, b"192.168.1.10 nas.lan nas\n").unwrap();
        let mut engine = UdpResolverEngine::new("/nonexistent").with_hosts(hosts.path());
        engine.load_hosts().unwrap();
        engine.enable_async().unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let id = engine
            .submit_ptr(
                "10.1.168.192.IN-ADDR.ARPA.",
                Box::new(move |id, result| {
                    let _ = tx.send((id, result));
                }),
            )
            .unwrap();
        assert!(rx.try_recv().is_err(), "callback must wait for process_pending");
        assert_eq!(engine.in_flight(), 0);

        engine.process_pending().unwrap();
        let (answered, result) = rx.try_recv().unwrap();
        assert_eq!(answered, id);
        let answer = result.unwrap();
        assert_eq!(answer.rcode, 0);
        assert_eq!(answer.rdata, vec![b"\x03nas\x03lan\x00".to_vec()]);
    }

    #[test]
    fn test_cancelled_hosts_answer_is_dropped() {
        let mut hosts = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut hosts, b"10.0.0.1 gateway.lan\n").unwrap();
        let mut engine = UdpResolverEngine::new("/nonexistent").with_hosts(hosts.path());
        engine.load_hosts().unwrap();
        engine.enable_async().unwrap();

        let (tx, rx) = std::sync::mpsc::channel::<QueryId>();
        let id = engine
            .submit_ptr(
                "1.0.0.10.in-addr.arpa",
                Box::new(move |id, _| {
                    let _ = tx.send(id);
                }),
            )
            .unwrap();
        engine.cancel(id);
        engine.process_pending().unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_resolv_conf_is_config_error() {
        let mut engine = UdpResolverEngine::new("/nonexistent/resolv.conf");
        assert!(matches!(engine.load_system_config(), Err(EngineError::Config(_))));
    }
}
