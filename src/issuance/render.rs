//! Scannable-code rendering. URL in, square grayscale bitmap out.

use super::IssuanceError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// Edge length in pixels of a rendered code unless configured otherwise.
pub const DEFAULT_CODE_SIZE: u32 = 200;

pub type CodeImage = GrayImage;

pub trait CodeRenderer: Send + Sync {
    /// Edge length of every image this renderer produces.
    fn size(&self) -> u32;

    fn render(&self, data: &str) -> Result<CodeImage, IssuanceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct QrRenderer {
    size: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self {
            size: DEFAULT_CODE_SIZE,
        }
    }
}

impl QrRenderer {
    /// Zero falls back to the default size.
    pub fn new(size: u32) -> Self {
        if size == 0 {
            return Self::default();
        }
        Self { size }
    }
}

impl CodeRenderer for QrRenderer {
    fn size(&self) -> u32 {
        self.size
    }

    fn render(&self, data: &str) -> Result<CodeImage, IssuanceError> {
        let code = QrCode::new(data.as_bytes()).map_err(|e| IssuanceError::Render(e.to_string()))?;
        let raw = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build();

        // Module grid rarely divides the target size; snap to it exactly.
        if raw.width() == self.size && raw.height() == self.size {
            return Ok(raw);
        }
        Ok(imageops::resize(&raw, self.size, self.size, FilterType::Nearest))
    }
}

pub fn encode_png(image: &CodeImage) -> Result<Vec<u8>, IssuanceError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
