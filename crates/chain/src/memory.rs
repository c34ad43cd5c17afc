//! In-memory short-link service with failure injection, for tests.

use std::collections::{HashMap, VecDeque};
use std::future::ready;
use std::sync::Mutex;

use crate::service::{Probe, ServiceError, ServiceFuture, ShortLinkService};

const PREFIX: &str = "http://mem.test/";

#[derive(Debug, Clone)]
pub(crate) struct StoredRecord {
    pub target: String,
    pub password: String,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, StoredRecord>,
    creates: u32,
    sent: Vec<String>,
    resolves: u32,
    probes: u32,
    create_failures: VecDeque<ServiceError>,
    always_fail_create: Option<ServiceError>,
    always_fail_resolve: Option<ServiceError>,
    always_fail_probe: Option<ServiceError>,
    probe_reports_exists: bool,
}

/// Records live in a map keyed by code. Call counters include failed calls.
pub(crate) struct MemoryService {
    inner: Mutex<Inner>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Inserts a record directly, bypassing counters and failures.
    pub fn insert(&self, code: &str, target: &str, password: &str) {
        self.inner.lock().unwrap().records.insert(
            code.to_string(),
            StoredRecord {
                target: target.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Queues a failure for the next create call.
    pub fn fail_next_create(&self, err: ServiceError) {
        self.inner.lock().unwrap().create_failures.push_back(err);
    }

    pub fn fail_every_create(&self, err: ServiceError) {
        self.inner.lock().unwrap().always_fail_create = Some(err);
    }

    pub fn fail_every_resolve(&self, err: ServiceError) {
        self.inner.lock().unwrap().always_fail_resolve = Some(err);
    }

    pub fn fail_every_probe(&self, err: ServiceError) {
        self.inner.lock().unwrap().always_fail_probe = Some(err);
    }

    /// Makes every probe report an existing record.
    pub fn probe_reports_exists(&self) {
        self.inner.lock().unwrap().probe_reports_exists = true;
    }

    pub fn record(&self, code: &str) -> Option<StoredRecord> {
        self.inner.lock().unwrap().records.get(code).cloned()
    }

    pub fn codes(&self) -> Vec<String> {
        self.inner.lock().unwrap().records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Every code passed to create, in call order, failed calls included.
    pub fn sent_codes(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn creates(&self) -> u32 {
        self.inner.lock().unwrap().creates
    }

    pub fn resolves(&self) -> u32 {
        self.inner.lock().unwrap().resolves
    }

    pub fn probes(&self) -> u32 {
        self.inner.lock().unwrap().probes
    }

    fn do_create(&self, target: &str, code: &str, password: &str) -> Result<String, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.creates += 1;
        inner.sent.push(code.to_string());
        if let Some(err) = inner.create_failures.pop_front() {
            return Err(err);
        }
        if let Some(err) = &inner.always_fail_create {
            return Err(err.clone());
        }
        if inner.records.contains_key(code) {
            return Err(ServiceError::Rejected(format!("tag {code} already in use")));
        }
        inner.records.insert(
            code.to_string(),
            StoredRecord {
                target: target.to_string(),
                password: password.to_string(),
            },
        );
        Ok(format!("{PREFIX}{code}"))
    }

    fn do_resolve(&self, url: &str, password: &str) -> Result<String, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.resolves += 1;
        if let Some(err) = &inner.always_fail_resolve {
            return Err(err.clone());
        }
        let code = url
            .strip_prefix(PREFIX)
            .ok_or_else(|| ServiceError::Rejected(format!("foreign URL {url}")))?;
        let record = inner
            .records
            .get(code)
            .ok_or_else(|| ServiceError::Rejected(format!("no such code {code}")))?;
        if record.password != password {
            return Err(ServiceError::Rejected("wrong password".into()));
        }
        Ok(record.target.clone())
    }

    fn do_probe(&self, url: &str) -> Result<Probe, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.probes += 1;
        if let Some(err) = &inner.always_fail_probe {
            return Err(err.clone());
        }
        if inner.probe_reports_exists {
            return Ok(Probe::Exists);
        }
        let exists = url
            .strip_prefix(PREFIX)
            .is_some_and(|code| inner.records.contains_key(code));
        Ok(if exists { Probe::Exists } else { Probe::Missing })
    }
}

impl ShortLinkService for MemoryService {
    fn prefix(&self) -> &str {
        PREFIX
    }

    fn create<'a>(
        &'a self,
        target: &'a str,
        code: &'a str,
        password: &'a str,
    ) -> ServiceFuture<'a, String> {
        Box::pin(ready(self.do_create(target, code, password)))
    }

    fn resolve<'a>(&'a self, url: &'a str, password: &'a str) -> ServiceFuture<'a, String> {
        Box::pin(ready(self.do_resolve(url, password)))
    }

    fn probe<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Probe> {
        Box::pin(ready(self.do_probe(url)))
    }
}
