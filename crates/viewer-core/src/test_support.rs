use flipbook_engine::{
    DocumentHandle, OpenSource, PageSize, PdfEngine, PdfEngineError, RenderRequest, RgbaImage,
};
use image::Rgba;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };
pub const INK: Rgba<u8> = Rgba([10, 20, 30, 255]);

/// Engine double with a fixed page list. Counts render calls and fails on
/// chosen page indices.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    pages: Vec<PageSize>,
    failing: HashSet<u32>,
    fail_open: bool,
    renders: Arc<AtomicUsize>,
    open_docs: Vec<DocumentHandle>,
    handle_seq: u64,
}

impl FakeEngine {
    pub fn letter(count: usize) -> Self {
        Self::with_pages(vec![LETTER; count])
    }

    pub fn with_pages(pages: Vec<PageSize>) -> Self {
        Self {
            pages,
            failing: HashSet::new(),
            fail_open: false,
            renders: Arc::new(AtomicUsize::new(0)),
            open_docs: Vec::new(),
            handle_seq: 0,
        }
    }

    pub fn failing_on(mut self, page_index: u32) -> Self {
        self.failing.insert(page_index);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn set_fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Shared counter, still readable after the engine moves into a viewer.
    pub fn render_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.renders)
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn open_documents(&self) -> usize {
        self.open_docs.len()
    }
}

impl PdfEngine for FakeEngine {
    fn open(&mut self, _source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        if self.fail_open {
            return Err(PdfEngineError::Backend("unreadable document".into()));
        }
        self.handle_seq += 1;
        let handle = DocumentHandle::from_raw(self.handle_seq);
        self.open_docs.push(handle);
        Ok(handle)
    }

    fn page_count(&self, _handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.pages.len() as u32)
    }

    fn page_size(&self, _handle: DocumentHandle, page_index: u32) -> Result<PageSize, PdfEngineError> {
        self.pages.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: self.pages.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&request.page_index) {
            return Err(PdfEngineError::Backend(format!("page {} is corrupt", request.page_index)));
        }

        let (width, height) = self.page_size(handle, request.page_index)?.scaled(request.scale);
        Ok(RgbaImage::from_pixel(width.ceil() as u32, height.ceil() as u32, INK))
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.open_docs.retain(|open| *open != handle);
        Ok(())
    }
}
