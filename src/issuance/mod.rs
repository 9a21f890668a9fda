//! Code issuance: created snippet → share URL → square code image → export.
//!
//! Everything here is a side computation on a `Created` result. Nothing in
//! this module touches lifecycle state or talks to the service.

pub mod export;
pub mod render;

pub use export::{
    copy_password, download_png, file_name_for, share_code, Clipboard, ExportError, ExportNotice,
    SharePayload, ShareTarget,
};
pub use render::{encode_png, CodeImage, CodeRenderer, QrRenderer, DEFAULT_CODE_SIZE};

use crate::access::ID_PARAM;
use crate::snippet::{CreatedSnippet, SnippetId};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("Origin cannot carry a view path: {0}")]
    InvalidOrigin(String),

    #[error("Could not render code: {0}")]
    Render(String),

    #[error("Could not encode code image: {0}")]
    Encode(#[from] image::ImageError),
}

/// `<origin>/view?id=<id>`, the URL a scanned code opens.
pub fn share_url(origin: &Url, id: &SnippetId) -> Result<Url, IssuanceError> {
    let mut url = origin.clone();
    url.path_segments_mut()
        .map_err(|_| IssuanceError::InvalidOrigin(origin.to_string()))?
        .pop_if_empty()
        .push("view");
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair(ID_PARAM, id.as_str());
    Ok(url)
}

/// The distributable side of a freshly created snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub id: SnippetId,
    pub title: String,
    pub url: Url,
}

impl IssuedCode {
    pub fn new(origin: &Url, id: SnippetId, title: impl Into<String>) -> Result<Self, IssuanceError> {
        Ok(Self {
            url: share_url(origin, &id)?,
            id,
            title: title.into(),
        })
    }

    /// Issue a code for a snippet the service just created.
    pub fn from_created(
        origin: &Url,
        created: &CreatedSnippet,
        title: impl Into<String>,
    ) -> Result<Self, IssuanceError> {
        Self::new(origin, created.id.clone(), title)
    }

    pub fn render(&self, renderer: &dyn CodeRenderer) -> Result<CodeImage, IssuanceError> {
        renderer.render(self.url.as_str())
    }
}
