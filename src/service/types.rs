//! Wire payloads exchanged with the snippet service.

use crate::snippet::{join_tags, CreateRequest, SnippetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub struct CreateBody<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub password: &'a str,
    /// Comma-joined, as the service expects.
    pub tags: String,
}

impl<'a> From<&'a CreateRequest> for CreateBody<'a> {
    fn from(request: &'a CreateRequest) -> Self {
        Self {
            title: request.title(),
            message: request.message(),
            password: request.password(),
            tags: join_tags(request.tags()),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CreateReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<SnippetId>,
    #[serde(rename = "encryptedData", default)]
    pub encrypted_data: Option<String>,
}

/// Single snippet lookup. The service does not echo the id back.
#[derive(Deserialize, Debug)]
pub struct FetchReply {
    pub title: String,
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct DecryptBody<'a> {
    pub id: &'a SnippetId,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct DecryptReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body shape. Some endpoints use `message` instead of `error`.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Service text, if any non-blank text was sent.
    pub fn text(self) -> Option<String> {
        let present = |text: &String| !text.trim().is_empty();
        self.error.filter(present).or(self.message.filter(present))
    }

    pub fn parse(raw: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(raw).ok().and_then(ErrorBody::text)
    }
}
