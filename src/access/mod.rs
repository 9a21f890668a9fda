//! Access resolution: how a view gets hold of the snippet it shows.
//!
//! A view either already has the full summary (opened from the collection) or
//! only an id (opened from a scanned code). Both paths end in the same
//! [`Located`] value so decrypt and delete never care which one was taken.

use crate::error::SnipResult;
use crate::service::SnippetService;
use crate::snippet::{SnippetId, SnippetSummary};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Query parameter carrying the id in shared-code URLs.
pub const ID_PARAM: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetRef {
    /// Full record in hand; no fetch needed.
    Direct(SnippetSummary),
    /// Only the id is known; the service is asked for the rest.
    Id(SnippetId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareUrlError {
    #[error("Link is not a valid URL: {0}")]
    Invalid(String),
    #[error("Link does not carry a snippet id.")]
    MissingId,
}

impl SnippetRef {
    pub fn id(&self) -> &SnippetId {
        match self {
            SnippetRef::Direct(summary) => &summary.id,
            SnippetRef::Id(id) => id,
        }
    }

    /// Pull the snippet id out of a shared-code URL (`...?id=<id>`).
    pub fn from_share_url(url: &Url) -> Result<Self, ShareUrlError> {
        url.query_pairs()
            .find(|(key, _)| key == ID_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| SnippetRef::Id(SnippetId::new(value)))
            .ok_or(ShareUrlError::MissingId)
    }

    /// Accept either a full shared URL or a bare id.
    pub fn parse(input: &str) -> Result<Self, ShareUrlError> {
        let input = input.trim();
        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| ShareUrlError::Invalid(e.to_string()))?;
            return Self::from_share_url(&url);
        }
        if input.is_empty() {
            return Err(ShareUrlError::MissingId);
        }
        Ok(SnippetRef::Id(SnippetId::new(input)))
    }
}

impl From<SnippetSummary> for SnippetRef {
    fn from(summary: SnippetSummary) -> Self {
        SnippetRef::Direct(summary)
    }
}

impl From<SnippetId> for SnippetRef {
    fn from(id: SnippetId) -> Self {
        SnippetRef::Id(id)
    }
}

/// What decrypt and delete work from, whichever way the snippet was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub id: SnippetId,
    pub title: String,
    pub encrypted_payload: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<SnippetSummary> for Located {
    fn from(summary: SnippetSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            encrypted_payload: summary.encrypted_payload,
            created_at: summary.created_at,
        }
    }
}

impl Located {
    /// Title for display; the service may hand back an empty one.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Snippet"
        } else {
            &self.title
        }
    }
}

/// Resolve a reference. Only id-only references touch the service.
pub async fn resolve<S>(service: &S, reference: SnippetRef) -> SnipResult<Located>
where
    S: SnippetService + ?Sized,
{
    match reference {
        SnippetRef::Direct(summary) => {
            debug!(id = %summary.id, "located from direct reference");
            Ok(summary.into())
        }
        SnippetRef::Id(id) => {
            debug!(%id, source = service.name(), "fetching snippet by id");
            let summary = service.fetch_by_id(&id).await?;
            Ok(summary.into())
        }
    }
}
