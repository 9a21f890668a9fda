//! Snippet records as the client sees them: ids, summaries, drafts and tags.

pub mod secret;
pub mod tags;

pub use secret::Secret;
pub use tags::{join_tags, parse_tags};

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum password length accepted before a create request is built.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Opaque identifier assigned by the snippet service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(String);

impl SnippetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SnippetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SnippetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Listing entry. Never carries plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SummaryWire")]
pub struct SnippetSummary {
    #[serde(rename = "_id")]
    pub id: SnippetId,
    pub title: String,
    #[serde(rename = "encryptedData")]
    pub encrypted_payload: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Services may send `_id`, `id` or both; `_id` wins.
#[derive(Deserialize)]
struct SummaryWire {
    #[serde(rename = "_id")]
    mongo_id: Option<SnippetId>,
    id: Option<SnippetId>,
    title: String,
    #[serde(rename = "encryptedData")]
    encrypted_payload: String,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<SummaryWire> for SnippetSummary {
    type Error = String;

    fn try_from(wire: SummaryWire) -> Result<Self, Self::Error> {
        let id = wire
            .mongo_id
            .or(wire.id)
            .ok_or_else(|| "missing field `_id`".to_string())?;
        Ok(Self {
            id,
            title: wire.title,
            encrypted_payload: wire.encrypted_payload,
            created_at: wire.created_at,
        })
    }
}

/// What the service hands back after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSnippet {
    pub id: SnippetId,
    pub encrypted_payload: String,
}

/// Unvalidated creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub message: Secret,
    pub password: Secret,
    /// Raw comma-separated tag input.
    pub tags: String,
}

impl Draft {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        password: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: Secret::new(message),
            password: Secret::new(password),
            tags: tags.into(),
        }
    }

    /// Run the pre-flight checks and build the request the service accepts.
    pub fn validate(&self) -> Result<CreateRequest, ValidationError> {
        CreateRequest::new(&self.title, &self.message, &self.password, &self.tags)
    }
}

/// A create request that already passed the client-side checks.
///
/// The only constructor validates, so an invalid draft cannot be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    title: String,
    message: Secret,
    password: Secret,
    tags: Vec<String>,
}

impl CreateRequest {
    pub fn new(
        title: &str,
        message: &str,
        password: &str,
        tags: &str,
    ) -> Result<Self, ValidationError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        Ok(Self {
            title: title.to_string(),
            message: Secret::new(message),
            password: Secret::new(password),
            tags: parse_tags(tags),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        self.message.expose()
    }

    pub fn password(&self) -> &str {
        self.password.expose()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}
