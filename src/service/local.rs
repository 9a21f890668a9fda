//! In-process snippet service.
//!
//! Behaves like the hosted service (same replies, same error texts) but keeps
//! everything in memory for the lifetime of the process. Messages are sealed
//! with Argon2id → AES-256-GCM; the payload is `base64(salt ‖ nonce ‖ ciphertext)`.

use super::SnippetService;
use crate::error::{SnipError, SnipResult};
use crate::snippet::{CreateRequest, CreatedSnippet, Secret, SnippetId, SnippetSummary};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

// Kept light: this service only lives as long as the process.
const KDF_MEMORY_KIB: u32 = 8 * 1024;
const KDF_ITERATIONS: u32 = 1;

const WRONG_PASSWORD: &str = "Invalid password";
const NOT_FOUND: &str = "Snippet not found";

#[derive(Debug, Clone)]
struct StoredSnippet {
    summary: SnippetSummary,
    tags: Vec<String>,
}

/// Snippets live until deleted or until the process exits.
#[derive(Default)]
pub struct LocalSnippetService {
    store: RwLock<Vec<StoredSnippet>>,
}

impl LocalSnippetService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags recorded for a snippet, in creation order.
    pub async fn tags(&self, id: &SnippetId) -> Option<Vec<String>> {
        let store = self.store.read().await;
        store
            .iter()
            .find(|s| &s.summary.id == id)
            .map(|s| s.tags.clone())
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

fn derive_key(password: &str, salt: &[u8]) -> SnipResult<Zeroizing<[u8; 32]>> {
    let params = argon2::Params::new(
        KDF_MEMORY_KIB,
        KDF_ITERATIONS,
        1,    // parallelism
        Some(32),
    )
    .map_err(|e| SnipError::Transport(format!("Key derivation failed: {}", e)))?;
    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| SnipError::Transport(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

fn seal(password: &str, message: &str) -> SnipResult<String> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password, &salt)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, message.as_bytes())
        .map_err(|_| SnipError::Transport("Encryption failed".to_string()))?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(nonce.as_slice());
    payload.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(payload))
}

fn open(password: &str, payload: &str) -> SnipResult<Secret> {
    let raw = STANDARD
        .decode(payload)
        .map_err(|_| SnipError::Transport("Stored payload is corrupt".to_string()))?;
    if raw.len() < SALT_LEN + NONCE_LEN {
        return Err(SnipError::Transport("Stored payload is corrupt".to_string()));
    }
    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SnipError::WrongPassword(WRONG_PASSWORD.to_string()))?,
    );

    String::from_utf8(plaintext.to_vec())
        .map(Secret::new)
        .map_err(|_| SnipError::Transport("Stored payload is corrupt".to_string()))
}

/// Key derivation is CPU bound; keep it off the async workers.
async fn off_executor<T, F>(work: F) -> SnipResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SnipResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SnipError::Transport(format!("Crypto task failed: {}", e)))?
}

#[async_trait]
impl SnippetService for LocalSnippetService {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip_all, fields(title = request.title()))]
    async fn create(&self, request: &CreateRequest) -> SnipResult<CreatedSnippet> {
        let password = Secret::new(request.password());
        let message = Secret::new(request.message());
        let encrypted_payload =
            off_executor(move || seal(password.expose(), message.expose())).await?;
        let id = SnippetId::new(Uuid::new_v4().to_string());

        self.store.write().await.push(StoredSnippet {
            summary: SnippetSummary {
                id: id.clone(),
                title: request.title().to_string(),
                encrypted_payload: encrypted_payload.clone(),
                created_at: Some(Utc::now()),
            },
            tags: request.tags().to_vec(),
        });
        debug!(%id, "snippet stored");

        Ok(CreatedSnippet {
            id,
            encrypted_payload,
        })
    }

    async fn list(&self) -> SnipResult<Vec<SnippetSummary>> {
        let store = self.store.read().await;
        Ok(store.iter().map(|s| s.summary.clone()).collect())
    }

    async fn fetch_by_id(&self, id: &SnippetId) -> SnipResult<SnippetSummary> {
        let store = self.store.read().await;
        store
            .iter()
            .find(|s| &s.summary.id == id)
            .map(|s| s.summary.clone())
            .ok_or_else(|| SnipError::NotFound(NOT_FOUND.to_string()))
    }

    #[instrument(skip(self, password), fields(id = %id))]
    async fn decrypt(&self, id: &SnippetId, password: &str) -> SnipResult<Secret> {
        let payload = {
            let store = self.store.read().await;
            store
                .iter()
                .find(|s| &s.summary.id == id)
                .map(|s| s.summary.encrypted_payload.clone())
                .ok_or_else(|| SnipError::NotFound(NOT_FOUND.to_string()))?
        };
        let password = Secret::new(password);
        off_executor(move || open(password.expose(), &payload)).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &SnippetId) -> SnipResult<()> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|s| &s.summary.id != id);
        if store.len() == before {
            return Err(SnipError::NotFound(NOT_FOUND.to_string()));
        }
        debug!("snippet removed");
        Ok(())
    }
}
