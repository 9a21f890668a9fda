//! Remote snippet service: the five operations the client can ask for.
//!
//! The service owns encryption. The client only ships requests and maps the
//! replies onto [`SnipError`](crate::error::SnipError); nothing here retries.

pub mod http;
pub mod local;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpSnippetService;
pub use local::LocalSnippetService;

use crate::error::SnipResult;
use crate::snippet::{CreateRequest, CreatedSnippet, Secret, SnippetId, SnippetSummary};
use async_trait::async_trait;

#[async_trait]
pub trait SnippetService: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Encrypt and store a new snippet.
    async fn create(&self, request: &CreateRequest) -> SnipResult<CreatedSnippet>;

    /// Every stored snippet, ciphertext only.
    async fn list(&self) -> SnipResult<Vec<SnippetSummary>>;

    async fn fetch_by_id(&self, id: &SnippetId) -> SnipResult<SnippetSummary>;

    /// Ask the service to open a snippet with a candidate password.
    async fn decrypt(&self, id: &SnippetId, password: &str) -> SnipResult<Secret>;

    async fn delete(&self, id: &SnippetId) -> SnipResult<()>;
}
