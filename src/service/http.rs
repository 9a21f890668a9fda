//! HTTP transport for the hosted snippet service.

use super::types::{
    CreateBody, CreateReply, DecryptBody, DecryptReply, DeleteReply, ErrorBody, FetchReply,
};
use super::SnippetService;
use crate::config::ServiceConfig;
use crate::error::{SnipError, SnipResult};
use crate::snippet::{CreateRequest, CreatedSnippet, Secret, SnippetId, SnippetSummary};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const UNEXPECTED_REPLY: &str = "Unexpected response from server. Please check the server logs.";
const MALFORMED_REPLY: &str = "Malformed response from snippet service.";
const NOT_FOUND: &str = "Snippet not found.";

#[derive(Debug, Clone, Copy)]
enum Op {
    Create,
    List,
    Fetch,
    Decrypt,
    Delete,
}

impl Op {
    fn label(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::List => "list",
            Op::Fetch => "fetch",
            Op::Decrypt => "decrypt",
            Op::Delete => "delete",
        }
    }

    /// Message shown when the service gave us nothing better.
    fn fallback(self) -> &'static str {
        match self {
            Op::Create => "Failed to create snippet.",
            Op::List => "Failed to load snippets.",
            Op::Fetch => "Failed to load snippet details.",
            Op::Decrypt => "Decryption failed.",
            Op::Delete => "Failed to delete snippet.",
        }
    }
}

pub struct HttpSnippetService {
    client: Client,
    base: Url,
}

impl HttpSnippetService {
    pub fn new(api_url: &str, timeout: Option<Duration>) -> SnipResult<Self> {
        let base = Url::parse(api_url)
            .map_err(|e| SnipError::Transport(format!("Invalid service URL '{}': {}", api_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(SnipError::Transport(format!(
                "Invalid service URL '{}': not a base URL",
                api_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SnipError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        info!(service = %base, "snippet service client ready");
        Ok(Self { client, base })
    }

    pub fn from_config(config: &ServiceConfig) -> SnipResult<Self> {
        Self::new(
            &config.api_url,
            config.request_timeout_seconds.map(Duration::from_secs),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> SnipResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SnipError::Transport("Invalid service URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send once and hand back the body of a successful reply.
    async fn send(&self, op: Op, request: RequestBuilder) -> SnipResult<String> {
        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timeout"
            } else if e.is_connect() {
                "connection error"
            } else {
                "network error"
            };
            warn!(operation = op.label(), reason, error = %e, "snippet service unreachable");
            SnipError::Transport(op.fallback().to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(operation = op.label(), error = %e, "failed to read service reply");
            SnipError::Transport(op.fallback().to_string())
        })?;

        if status.is_success() {
            return Ok(body);
        }

        let text = ErrorBody::parse(&body);
        debug!(operation = op.label(), status = status.as_u16(), "service rejected request");
        Err(match (op, status.as_u16()) {
            (_, 404) => SnipError::NotFound(text.unwrap_or_else(|| NOT_FOUND.to_string())),
            (Op::Decrypt, 400..=499) => {
                SnipError::WrongPassword(text.unwrap_or_else(|| op.fallback().to_string()))
            }
            _ => SnipError::Transport(text.unwrap_or_else(|| op.fallback().to_string())),
        })
    }

    fn decode<T: DeserializeOwned>(op: Op, body: &str) -> SnipResult<T> {
        serde_json::from_str(body).map_err(|e| {
            warn!(operation = op.label(), error = %e, "undecodable service reply");
            SnipError::Transport(MALFORMED_REPLY.to_string())
        })
    }
}

#[async_trait]
impl SnippetService for HttpSnippetService {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip_all, fields(title = request.title()))]
    async fn create(&self, request: &CreateRequest) -> SnipResult<CreatedSnippet> {
        let url = self.endpoint(&["api", "snippets"])?;
        let body = self
            .send(Op::Create, self.client.post(url).json(&CreateBody::from(request)))
            .await?;
        let reply: CreateReply = Self::decode(Op::Create, &body)?;

        match reply {
            CreateReply {
                success: true,
                id: Some(id),
                encrypted_data: Some(encrypted_payload),
            } => {
                info!(%id, "snippet created");
                Ok(CreatedSnippet {
                    id,
                    encrypted_payload,
                })
            }
            _ => Err(SnipError::Transport(UNEXPECTED_REPLY.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> SnipResult<Vec<SnippetSummary>> {
        let url = self.endpoint(&["api", "snippets"])?;
        let body = self.send(Op::List, self.client.get(url)).await?;
        let items: Vec<SnippetSummary> = Self::decode(Op::List, &body)?;
        debug!(count = items.len(), "snippets listed");
        Ok(items)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_by_id(&self, id: &SnippetId) -> SnipResult<SnippetSummary> {
        let url = self.endpoint(&["api", "snippets", id.as_str()])?;
        let body = self.send(Op::Fetch, self.client.get(url)).await?;
        let reply: FetchReply = Self::decode(Op::Fetch, &body)?;
        Ok(SnippetSummary {
            id: id.clone(),
            title: reply.title,
            encrypted_payload: reply.encrypted_data,
            created_at: reply.created_at,
        })
    }

    #[instrument(skip(self, password), fields(id = %id))]
    async fn decrypt(&self, id: &SnippetId, password: &str) -> SnipResult<Secret> {
        let url = self.endpoint(&["api", "decrypt"])?;
        let body = Secret::new(
            self.send(
                Op::Decrypt,
                self.client.post(url).json(&DecryptBody { id, password }),
            )
            .await?,
        );
        let reply: DecryptReply = Self::decode(Op::Decrypt, &body)?;

        match reply {
            DecryptReply {
                success: true,
                message: Some(message),
                ..
            } => Ok(Secret::new(message)),
            DecryptReply { success: true, .. } => {
                Err(SnipError::Transport(MALFORMED_REPLY.to_string()))
            }
            DecryptReply { error, .. } => Err(SnipError::WrongPassword(
                error
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| Op::Decrypt.fallback().to_string()),
            )),
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &SnippetId) -> SnipResult<()> {
        let url = self.endpoint(&["api", "snippets", id.as_str()])?;
        let body = self.send(Op::Delete, self.client.delete(url)).await?;
        let reply: DeleteReply = Self::decode(Op::Delete, &body)?;

        if reply.success {
            info!("snippet deleted");
            Ok(())
        } else {
            Err(SnipError::Transport(
                reply
                    .error
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| Op::Delete.fallback().to_string()),
            ))
        }
    }
}
