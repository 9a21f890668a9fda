//! Fire-and-forget export of an issued code: share, clipboard, download.
//!
//! Platform facilities may be missing. Every helper reports back with an
//! [`ExportNotice`] instead of an error so the caller can just show it.

use super::render::{encode_png, CodeImage};
use super::IssuedCode;
use crate::snippet::Secret;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const SHARE_UNSUPPORTED: &str = "Sharing is not supported on this device.";
pub const COPY_FAILED: &str = "Failed to copy password. Please copy it manually.";

const SHARE_TITLE: &str = "SecureSnip QR Code";
const SHARE_TEXT: &str = "Scan this QR code to view the secure message.";
const SHARE_FILE_NAME: &str = "qrcode.png";
const FALLBACK_STEM: &str = "qrcode";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Platform refused the request: {0}")]
    Platform(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Issuance(#[from] super::IssuanceError),
}

/// What a share target receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub file_name: String,
    pub png: Vec<u8>,
    pub title: String,
    pub text: String,
}

pub trait ShareTarget: Send + Sync {
    fn is_available(&self) -> bool;
    fn share(&self, payload: SharePayload) -> Result<(), ExportError>;
}

pub trait Clipboard: Send + Sync {
    fn is_available(&self) -> bool;
    fn copy(&self, text: &str) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotice {
    Shared,
    Copied,
    Saved(PathBuf),
    Unsupported(String),
    Failed(String),
}

impl ExportNotice {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportNotice::Shared | ExportNotice::Copied | ExportNotice::Saved(_))
    }

    pub fn message(&self) -> String {
        match self {
            ExportNotice::Shared => "Shared.".to_string(),
            ExportNotice::Copied => "Copied!".to_string(),
            ExportNotice::Saved(path) => format!("Saved {}", path.display()),
            ExportNotice::Unsupported(text) | ExportNotice::Failed(text) => text.clone(),
        }
    }
}

/// Hand the code image to the platform share sheet, if there is one.
pub fn share_code(target: Option<&dyn ShareTarget>, image: &CodeImage) -> ExportNotice {
    let Some(target) = target.filter(|t| t.is_available()) else {
        return ExportNotice::Unsupported(SHARE_UNSUPPORTED.to_string());
    };

    let png = match encode_png(image) {
        Ok(png) => png,
        Err(e) => return ExportNotice::Failed(e.to_string()),
    };
    let payload = SharePayload {
        file_name: SHARE_FILE_NAME.to_string(),
        png,
        title: SHARE_TITLE.to_string(),
        text: SHARE_TEXT.to_string(),
    };

    match target.share(payload) {
        Ok(()) => ExportNotice::Shared,
        Err(e) => {
            warn!(error = %e, "share failed");
            ExportNotice::Failed(e.to_string())
        }
    }
}

pub fn copy_password(clipboard: Option<&dyn Clipboard>, password: &Secret) -> ExportNotice {
    let Some(clipboard) = clipboard.filter(|c| c.is_available()) else {
        return ExportNotice::Failed(COPY_FAILED.to_string());
    };
    match clipboard.copy(password.expose()) {
        Ok(()) => ExportNotice::Copied,
        Err(e) => {
            warn!(error = %e, "clipboard copy failed");
            ExportNotice::Failed(COPY_FAILED.to_string())
        }
    }
}

/// File name for a downloaded code: the title with path-hostile characters
/// replaced, or `qrcode` when nothing usable is left.
pub fn file_name_for(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        format!("{}.png", FALLBACK_STEM)
    } else {
        format!("{}.png", stem)
    }
}

/// Write the code as `<title>.png` into `dir`.
pub fn download_png(dir: &Path, title: &str, image: &CodeImage) -> Result<PathBuf, ExportError> {
    let png = encode_png(image)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name_for(title));
    fs::write(&path, png)?;
    info!(path = %path.display(), "code image saved");
    Ok(path)
}

impl IssuedCode {
    /// Download under this code's title, reported as a notice.
    pub fn save_to(&self, dir: &Path, image: &CodeImage) -> ExportNotice {
        match download_png(dir, &self.title, image) {
            Ok(path) => ExportNotice::Saved(path),
            Err(e) => {
                warn!(error = %e, "code download failed");
                ExportNotice::Failed(e.to_string())
            }
        }
    }
}
