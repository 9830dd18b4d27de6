#![allow(dead_code)]
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// What the mock server sends back for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Ptr(Vec<String>),
    NxDomain,
    ServFail,
    Truncated,
    /// Answer with a different transaction id.
    WrongId,
    /// Answer a different question with the right transaction id.
    WrongQuestion,
    /// Send nothing back.
    Ignore,
}

impl MockReply {
    pub fn ptr(host: &str) -> Self {
        MockReply::Ptr(vec![host.to_string()])
    }
}

struct Shared {
    replies: Mutex<HashMap<String, MockReply>>,
    received: AtomicUsize,
    stop: AtomicBool,
}

/// UDP server on 127.0.0.1 answering PTR questions from a fixed table.
/// Unknown names get NXDOMAIN.
pub struct MockDnsServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl MockDnsServer {
    pub fn start() -> Result<Self, std::io::Error> {
        Self::start_on("127.0.0.1:0".parse().unwrap())
    }

    pub fn start_on(bind: SocketAddr) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(bind)?;
        socket.set_read_timeout(Some(Duration::from_millis(20)))?;
        let addr = socket.local_addr()?;

        let shared = Arc::new(Shared {
            replies: Mutex::new(HashMap::new()),
            received: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let mut buf = vec![0u8; 512];
            while !thread_shared.stop.load(Ordering::SeqCst) {
                let Ok((len, peer)) = socket.recv_from(&mut buf) else {
                    continue;
                };
                thread_shared.received.fetch_add(1, Ordering::SeqCst);

                let Some(name) = question_name(&buf[..len]) else {
                    continue;
                };
                let reply = thread_shared
                    .replies
                    .lock()
                    .unwrap()
                    .get(&name)
                    .cloned()
                    .unwrap_or(MockReply::NxDomain);
                if let Some(response) = Self::build_mock_response(&buf[..len], &reply) {
                    let _ = socket.send_to(&response, peer);
                }
            }
        });

        Ok(Self {
            addr,
            shared,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn reply(&self, name: &str, reply: MockReply) {
        self.shared
            .replies
            .lock()
            .unwrap()
            .insert(name.to_ascii_lowercase(), reply);
    }

    pub fn received(&self) -> usize {
        self.shared.received.load(Ordering::SeqCst)
    }

    fn build_mock_response(query: &[u8], reply: &MockReply) -> Option<Vec<u8>> {
        if query.len() < 12 {
            return None;
        }
        let question_end = 12 + question_len(&query[12..])?;

        let (rcode, tc) = match reply {
            MockReply::Ignore => return None,
            MockReply::NxDomain => (3, 0),
            MockReply::ServFail => (2, 0),
            MockReply::Truncated => (0, 0x02),
            _ => (0, 0),
        };
        let hosts: &[String] = match reply {
            MockReply::Ptr(hosts) => hosts,
            _ => &[],
        };

        let mut response = Vec::with_capacity(512);

        if *reply == MockReply::WrongId {
            response.extend_from_slice(&[query[0] ^ 0xff, query[1]]);
        } else {
            response.extend_from_slice(&query[0..2]);
        }

        response.push(0x81 | tc);
        response.push(0x80 | rcode);

        response.extend_from_slice(&[0x00, 0x01]);
        response.extend_from_slice(&(hosts.len() as u16).to_be_bytes());
        response.extend_from_slice(&[0x00, 0x00]);
        response.extend_from_slice(&[0x00, 0x00]);

        if *reply == MockReply::WrongQuestion {
            response.extend_from_slice(&wire_name("99.99.99.99.in-addr.arpa"));
            response.extend_from_slice(&[0x00, 0x0c, 0x00, 0x01]);
        } else {
            response.extend_from_slice(&query[12..question_end]);
        }

        for host in hosts {
            let rdata = wire_name(host);
            response.extend_from_slice(&[
                0xc0, 0x0c,
                0x00, 0x0c,
                0x00, 0x01,
                0x00, 0x00, 0x0e, 0x10,
            ]);
            response.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            response.extend_from_slice(&rdata);
        }

        Some(response)
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn wire_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// Length of the question (name, type and class) starting at `data`.
fn question_len(data: &[u8]) -> Option<usize> {
    let mut pos = 0;
    loop {
        let len = *data.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        pos += len;
    }
    (pos + 4 <= data.len()).then_some(pos + 4)
}

fn question_name(query: &[u8]) -> Option<String> {
    let data = query.get(12..)?;
    let mut labels = Vec::new();
    let mut pos = 0;
    loop {
        let len = *data.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        labels.push(String::from_utf8_lossy(data.get(pos..pos + len)?).to_ascii_lowercase());
        pos += len;
    }
    Some(labels.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_response_builder() {
        let mut query = vec![
            0xab, 0xcd,
            0x01, 0x00,
            0x00, 0x01,
            0x00, 0x00,
            0x00, 0x00,
            0x00, 0x00,
        ];
        query.extend_from_slice(&wire_name("1.0.0.127.in-addr.arpa"));
        query.extend_from_slice(&[0x00, 0x0c, 0x00, 0x01]);

        let response =
            MockDnsServer::build_mock_response(&query, &MockReply::ptr("localhost")).unwrap();

        assert_eq!(response[0..2], query[0..2], "Transaction ID should match");
        assert_eq!(response[2] & 0x80, 0x80, "QR bit should be set (response)");
        assert_eq!(&response[6..8], &[0x00, 0x01], "one answer");
        assert!(response.ends_with(b"\x09localhost\x00"));
    }

    #[test]
    fn test_question_name() {
        let mut query = vec![0; 12];
        query.extend_from_slice(&wire_name("4.3.2.1.IN-ADDR.ARPA"));
        assert_eq!(question_name(&query).as_deref(), Some("4.3.2.1.in-addr.arpa"));
    }
}
