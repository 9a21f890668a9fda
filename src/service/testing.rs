//! Test double: the in-process service plus call counters, failure injection
//! and gates that hold a request open until the test releases it.

use super::{LocalSnippetService, SnippetService};
use crate::error::{SnipError, SnipResult};
use crate::snippet::{CreateRequest, CreatedSnippet, Draft, Secret, SnippetId, SnippetSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub(crate) struct Gate {
    release: Notify,
}

#[derive(Default)]
pub(crate) struct TestService {
    inner: LocalSnippetService,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, SnipError>>,
    gates: Mutex<HashMap<&'static str, Arc<Gate>>>,
    in_flight: AtomicUsize,
}

impl TestService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, title: &str, message: &str, password: &str) -> SnippetSummary {
        let request = Draft::new(title, message, password, "").validate().unwrap();
        let created = self.inner.create(&request).await.unwrap();
        self.inner.fetch_by_id(&created.id).await.unwrap()
    }

    pub fn calls(&self, op: &'static str) -> usize {
        *self.calls.lock().unwrap().get(op).unwrap_or(&0)
    }

    pub fn fail(&self, op: &'static str, error: SnipError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    pub fn heal(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub fn gate(&self, op: &'static str) {
        self.gates.lock().unwrap().insert(op, Arc::new(Gate::default()));
    }

    pub fn release(&self, op: &'static str) {
        let gate = self.gates.lock().unwrap().get(op).cloned().unwrap();
        gate.release.notify_one();
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn local(&self) -> &LocalSnippetService {
        &self.inner
    }

    async fn enter(&self, op: &'static str) -> SnipResult<()> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        let gate = self.gates.lock().unwrap().get(op).cloned();
        if let Some(gate) = gate {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            gate.release.notified().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        match self.failures.lock().unwrap().get(op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SnippetService for TestService {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn create(&self, request: &CreateRequest) -> SnipResult<CreatedSnippet> {
        self.enter("create").await?;
        self.inner.create(request).await
    }

    async fn list(&self) -> SnipResult<Vec<SnippetSummary>> {
        self.enter("list").await?;
        self.inner.list().await
    }

    async fn fetch_by_id(&self, id: &SnippetId) -> SnipResult<SnippetSummary> {
        self.enter("fetch").await?;
        self.inner.fetch_by_id(id).await
    }

    async fn decrypt(&self, id: &SnippetId, password: &str) -> SnipResult<Secret> {
        self.enter("decrypt").await?;
        self.inner.decrypt(id, password).await
    }

    async fn delete(&self, id: &SnippetId) -> SnipResult<()> {
        self.enter("delete").await?;
        self.inner.delete(id).await
    }
}
