#![allow(dead_code)]

use ferrous_rdns_application::ports::{
    EngineAnswer, EngineCallback, EngineError, EngineFactory, ResolverEngine,
};
use ferrous_rdns_domain::{QueryId, RecordType};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// How the mock engine answers a given reverse name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAnswer {
    Hostname(String),
    NoData,
    Fail(String),
    /// Never answers; the query can only time out or be drained.
    Silent,
}

impl MockAnswer {
    pub fn hostname(name: &str) -> Self {
        MockAnswer::Hostname(name.to_string())
    }
}

/// Engine operation that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Create,
    SystemConfig,
    ConfigFile,
    EnableAsync,
    Submit,
}

/// Encodes a dotted name into uncompressed wire form.
pub fn wire_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

struct PendingSubmission {
    name: String,
    callback: EngineCallback,
}

struct EngineState {
    pending: Mutex<HashMap<QueryId, PendingSubmission>>,
    ready: Mutex<Vec<(QueryId, MockAnswer)>>,
    waker: UnixStream,
}

impl EngineState {
    fn schedule(&self, id: QueryId, answer: MockAnswer) {
        self.ready.lock().unwrap().push((id, answer));
        let _ = (&self.waker).write(&[1]);
    }
}

/// Behaviour and counters shared by every engine a factory creates.
#[derive(Default)]
pub struct MockControl {
    answers: Mutex<HashMap<String, MockAnswer>>,
    fail_at: Mutex<Option<FailAt>>,
    fixed_query_id: Mutex<Option<u64>>,
    ignore_cancel: Mutex<bool>,
    engines: Mutex<Vec<Weak<EngineState>>>,
    config_files: Mutex<Vec<PathBuf>>,
    next_query_id: AtomicU64,
    pub created: AtomicUsize,
    pub dropped: AtomicUsize,
    pub system_configs: AtomicUsize,
    pub submitted: AtomicUsize,
    pub cancelled: AtomicUsize,
}

impl MockControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, reverse_name: &str, answer: MockAnswer) {
        self.answers
            .lock()
            .unwrap()
            .insert(reverse_name.to_string(), answer);
    }

    pub fn fail_at(&self, stage: FailAt) {
        *self.fail_at.lock().unwrap() = Some(stage);
    }

    /// Makes every submission return the same query id.
    pub fn reuse_query_id(&self, id: u64) {
        *self.fixed_query_id.lock().unwrap() = Some(id);
    }

    /// Keeps cancelled queries pending so they can still be answered late.
    pub fn ignore_cancel(&self) {
        *self.ignore_cancel.lock().unwrap() = true;
    }

    /// Answers every query still pending in any engine with `answer`.
    pub fn answer_pending(&self, answer: MockAnswer) -> usize {
        let mut scheduled = 0;
        for engine in self.live_engines() {
            let ids: Vec<QueryId> = engine.pending.lock().unwrap().keys().copied().collect();
            for id in ids {
                engine.schedule(id, answer.clone());
                scheduled += 1;
            }
        }
        scheduled
    }

    pub fn pending(&self) -> usize {
        self.live_engines()
            .iter()
            .map(|engine| engine.pending.lock().unwrap().len())
            .sum()
    }

    pub fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.dropped.load(Ordering::SeqCst)
    }

    pub fn config_files(&self) -> Vec<PathBuf> {
        self.config_files.lock().unwrap().clone()
    }

    fn live_engines(&self) -> Vec<Arc<EngineState>> {
        self.engines
            .lock()
            .unwrap()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn fails_at(&self, stage: FailAt) -> bool {
        *self.fail_at.lock().unwrap() == Some(stage)
    }
}

/// Engine whose pollable descriptor is one end of a Unix socket pair; the
/// other end is written whenever an answer is ready.
pub struct MockEngine {
    control: Arc<MockControl>,
    state: Arc<EngineState>,
    reader: UnixStream,
}

impl MockEngine {
    fn new(control: Arc<MockControl>) -> std::io::Result<Self> {
        let (reader, waker) = UnixStream::pair()?;
        reader.set_nonblocking(true)?;
        let state = Arc::new(EngineState {
            pending: Mutex::new(HashMap::new()),
            ready: Mutex::new(Vec::new()),
            waker,
        });
        control.engines.lock().unwrap().push(Arc::downgrade(&state));
        control.created.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            control,
            state,
            reader,
        })
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.control.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl ResolverEngine for MockEngine {
    fn load_system_config(&mut self) -> Result<(), EngineError> {
        if self.control.fails_at(FailAt::SystemConfig) {
            return Err(EngineError::Config("resolv.conf unreadable".to_string()));
        }
        self.control.system_configs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_config_file(&mut self, path: &Path) -> Result<(), EngineError> {
        if self.control.fails_at(FailAt::ConfigFile) {
            return Err(EngineError::Config("syntax error".to_string()));
        }
        self.control
            .config_files
            .lock()
            .unwrap()
            .push(path.to_path_buf());
        Ok(())
    }

    fn enable_async(&mut self) -> Result<(), EngineError> {
        if self.control.fails_at(FailAt::EnableAsync) {
            return Err(EngineError::Async("threads unsupported".to_string()));
        }
        Ok(())
    }

    fn pollable_fd(&self) -> Result<RawFd, EngineError> {
        Ok(self.reader.as_raw_fd())
    }

    fn submit_ptr(&self, name: &str, callback: EngineCallback) -> Result<QueryId, EngineError> {
        if self.control.fails_at(FailAt::Submit) {
            return Err(EngineError::Submit("network unreachable".to_string()));
        }

        let id = match *self.control.fixed_query_id.lock().unwrap() {
            Some(id) => QueryId(id),
            None => QueryId(self.control.next_query_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        self.state.pending.lock().unwrap().insert(
            id,
            PendingSubmission {
                name: name.to_string(),
                callback,
            },
        );
        self.control.submitted.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .control
            .answers
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or(MockAnswer::Silent);
        if answer != MockAnswer::Silent {
            self.state.schedule(id, answer);
        }
        Ok(id)
    }

    fn cancel(&self, id: QueryId) {
        self.control.cancelled.fetch_add(1, Ordering::SeqCst);
        if !*self.control.ignore_cancel.lock().unwrap() {
            self.state.pending.lock().unwrap().remove(&id);
        }
    }

    fn process_pending(&self) -> Result<(), EngineError> {
        let mut buf = [0u8; 64];
        loop {
            match (&self.reader).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(EngineError::Process(e.to_string())),
            }
        }

        let ready: Vec<(QueryId, MockAnswer)> = self.state.ready.lock().unwrap().drain(..).collect();
        let mut due = Vec::new();
        {
            let mut pending = self.state.pending.lock().unwrap();
            for (id, answer) in ready {
                if let Some(submission) = pending.remove(&id) {
                    due.push((id, submission, answer));
                }
            }
        }

        // no engine lock held while callbacks run
        for (id, submission, answer) in due {
            let result = match answer {
                MockAnswer::Hostname(host) => Ok(EngineAnswer {
                    qname: submission.name,
                    qtype: RecordType::PTR,
                    rcode: 0,
                    rdata: vec![wire_name(&host)],
                }),
                MockAnswer::NoData => Ok(EngineAnswer::no_data(submission.name, 3)),
                MockAnswer::Fail(reason) => Err(EngineError::Resolve(reason)),
                MockAnswer::Silent => continue,
            };
            (submission.callback)(id, result);
        }
        Ok(())
    }
}

pub struct MockEngineFactory {
    pub control: Arc<MockControl>,
}

impl MockEngineFactory {
    pub fn new(control: Arc<MockControl>) -> Arc<Self> {
        Arc::new(Self { control })
    }
}

impl EngineFactory for MockEngineFactory {
    fn create_engine(&self) -> Result<Box<dyn ResolverEngine>, EngineError> {
        if self.control.fails_at(FailAt::Create) {
            return Err(EngineError::Create("out of memory".to_string()));
        }
        let engine = MockEngine::new(Arc::clone(&self.control))
            .map_err(|e| EngineError::Create(e.to_string()))?;
        Ok(Box::new(engine))
    }
}
