//! Document backend contract for the flipbook viewer.
//!
//! The viewer only needs four things from a document: how many pages it
//! has, how big each page is in points, a raster of a page at a given
//! scale, and a way to release it. [`PdfEngine`] captures that; the default
//! [`LopdfEngine`] reads page boxes with lopdf and paints placeholder paper.

use image::{ImageBuffer, Rgba};
use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod lopdf_engine;

pub use lopdf_engine::LopdfEngine;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque id for an open document, issued by [`PdfEngine::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// For engines other than [`LopdfEngine`] that mint their own ids.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Displayed page size in points (rotation already applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

    pub fn scaled(self, scale: f32) -> (f32, f32) {
        (self.width_pt * scale, self.height_pt * scale)
    }

    pub fn rotated(self) -> Self {
        Self { width_pt: self.height_pt, height_pt: self.width_pt }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    /// Device pixels per point. The output is `ceil(size_pt * scale)`.
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Document backend used by the viewer.
///
/// Page indices are zero-based here; the viewer speaks in one-based page
/// numbers and converts at the call site. `render_page` takes `&self` so
/// that both slots of a spread can render at once.
pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(&self, handle: DocumentHandle, page_index: u32)
        -> Result<PageSize, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
