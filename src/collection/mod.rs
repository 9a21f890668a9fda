//! Held snippet list: refresh, local filter, per-item delete.

use crate::error::{SnipError, SnipResult};
use crate::service::SnippetService;
use crate::snippet::{SnippetId, SnippetSummary};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Result of one delete request against the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Service confirmed; the item is gone from the held list.
    Deleted,
    /// A delete for this id was already in flight. Nothing was sent.
    Suppressed,
    /// Service refused; the item is still listed.
    Failed(SnipError),
}

/// Public handle to the collection.
pub struct Collection<S: ?Sized> {
    service: Arc<S>,
    inner: Arc<Mutex<CollectionInner>>,
}

impl<S: ?Sized> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Default)]
struct CollectionInner {
    items: Vec<SnippetSummary>,
    filter: String,
    pending: HashSet<SnippetId>, // ids with a delete in flight
    deleted: HashSet<SnippetId>, // confirmed gone, never listed again
    refreshes: u64,
    error: Option<SnipError>,
}

impl CollectionInner {
    fn visible(&self) -> Vec<SnippetSummary> {
        let needle = self.filter.to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn remove(&mut self, id: &SnippetId) -> bool {
        self.deleted.insert(id.clone());
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }
}

impl<S> Collection<S>
where
    S: SnippetService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            inner: Arc::new(Mutex::new(CollectionInner::default())),
        }
    }

    /// Reload from the service. On failure the previous items stay.
    ///
    /// A reply overtaken by a later refresh is dropped, and ids deleted through
    /// this collection are never listed again even if the reply predates the delete.
    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn refresh(&self) -> SnipResult<usize> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.refreshes += 1;
            inner.refreshes
        };
        let result = self.service.list().await;

        let mut inner = self.inner.lock().await;
        if ticket != inner.refreshes {
            debug!(ticket, latest = inner.refreshes, "stale snippet list dropped");
            return result.map(|_| inner.items.len());
        }
        match result {
            Ok(mut items) => {
                items.retain(|item| !inner.deleted.contains(&item.id));
                let count = items.len();
                inner.items = items;
                inner.error = None;
                info!(count, "snippet list refreshed");
                Ok(count)
            }
            Err(error) => {
                warn!(%error, kept = inner.items.len(), "snippet list refresh failed");
                inner.error = Some(error.clone());
                Err(error)
            }
        }
    }

    pub async fn set_filter(&self, text: impl Into<String>) {
        self.inner.lock().await.filter = text.into();
    }

    pub async fn filter(&self) -> String {
        self.inner.lock().await.filter.clone()
    }

    /// Items whose title contains the filter, ignoring case.
    pub async fn visible(&self) -> Vec<SnippetSummary> {
        self.inner.lock().await.visible()
    }

    /// Everything held, filter ignored.
    pub async fn items(&self) -> Vec<SnippetSummary> {
        self.inner.lock().await.items.clone()
    }

    /// Last refresh or delete failure, cleared by the next success.
    pub async fn error(&self) -> Option<SnipError> {
        self.inner.lock().await.error.clone()
    }

    pub async fn is_deleting(&self, id: &SnippetId) -> bool {
        self.inner.lock().await.pending.contains(id)
    }

    /// Drop an item that was deleted somewhere else (e.g. from its view).
    pub async fn forget(&self, id: &SnippetId) -> bool {
        let removed = self.inner.lock().await.remove(id);
        if removed {
            debug!(%id, "forgot deleted snippet");
        }
        removed
    }

    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn delete(&self, id: &SnippetId) -> DeleteOutcome {
        if !self.inner.lock().await.pending.insert(id.clone()) {
            debug!(%id, "delete already in flight");
            return DeleteOutcome::Suppressed;
        }

        let result = self.service.delete(id).await;

        let mut inner = self.inner.lock().await;
        inner.pending.remove(id);
        match result {
            Ok(()) => {
                inner.remove(id);
                inner.error = None;
                info!(%id, "snippet deleted");
                DeleteOutcome::Deleted
            }
            Err(error) => {
                warn!(%id, %error, "snippet delete failed");
                inner.error = Some(error.clone());
                DeleteOutcome::Failed(error)
            }
        }
    }

    /// Delete several ids at once. Each id is handled as by [`Collection::delete`].
    pub async fn delete_many(&self, ids: &[SnippetId]) -> Vec<(SnippetId, DeleteOutcome)> {
        let outcomes = join_all(ids.iter().map(|id| self.delete(id))).await;
        ids.iter().cloned().zip(outcomes).collect()
    }
}
