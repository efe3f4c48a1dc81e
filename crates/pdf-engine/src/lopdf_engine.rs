use crate::{
    DocumentHandle, OpenSource, PageSize, PdfEngine, PdfEngineError, RenderRequest, RgbaImage,
};
use image::Rgba;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::fs;

/// Page tree depth after which inherited attribute lookup gives up.
const MAX_TREE_DEPTH: usize = 32;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EDGE: Rgba<u8> = Rgba([220, 220, 220, 255]);

/// Default backend.
///
/// Page geometry comes from each page's CropBox (falling back to MediaBox),
/// inherited through the page tree and swapped for quarter-turn `/Rotate`.
/// Pages are rasterized as blank paper with a thin edge and a header band
/// whose shade varies by page, so spreads are visually distinguishable.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    issued: u64,
    documents: HashMap<DocumentHandle, Vec<PageSize>>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently open.
    pub fn open_documents(&self) -> usize {
        self.documents.len()
    }

    fn pages(&self, handle: DocumentHandle) -> Result<&[PageSize], PdfEngineError> {
        self.documents
            .get(&handle)
            .map(Vec::as_slice)
            .ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

impl PdfEngine for LopdfEngine {
    #[tracing::instrument(level = "debug", skip_all)]
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let sizes = read_page_sizes(&bytes)?;

        self.issued += 1;
        let handle = DocumentHandle(self.issued);
        tracing::debug!(handle = handle.raw(), pages = sizes.len(), "opened document");
        self.documents.insert(handle, sizes);

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.pages(handle)?.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let pages = self.pages(handle)?;
        pages.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: pages.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let size = self.page_size(handle, request.page_index)?;
        if !(request.scale.is_finite() && request.scale > 0.0) {
            return Err(PdfEngineError::Backend(format!("invalid render scale {}", request.scale)));
        }

        let (width, height) = size.scaled(request.scale);
        Ok(paint_paper(width.ceil().max(1.0) as u32, height.ceil().max(1.0) as u32, request.page_index))
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        match self.documents.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(PdfEngineError::InvalidHandle(handle.raw())),
        }
    }
}

fn read_page_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfEngineError> {
    if bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt") {
        return Err(PdfEngineError::EncryptedUnsupported);
    }

    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().into_values().map(|page_id| displayed_size(&doc, page_id)).collect())
}

fn displayed_size(doc: &Document, page_id: ObjectId) -> PageSize {
    let size = ["CropBox", "MediaBox"]
        .iter()
        .find_map(|key| inherited(doc, page_id, key.as_bytes()).and_then(box_size))
        .unwrap_or(PageSize::LETTER);

    let quarter_turn = inherited(doc, page_id, b"Rotate")
        .and_then(|rotate| rotate.as_i64().ok())
        .is_some_and(|degrees| degrees.rem_euclid(180) == 90);

    if quarter_turn {
        size.rotated()
    } else {
        size
    }
}

/// Look `key` up on the page, then on each ancestor in the page tree.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node: &Dictionary = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return doc.dereference(value).ok().map(|(_, object)| object);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

fn box_size(rect: &Object) -> Option<PageSize> {
    let [x0, y0, x1, y1] = rect.as_array().ok()?.as_slice() else {
        return None;
    };
    let coord = |object: &Object| object.as_float().ok();

    let width = (coord(x1)? - coord(x0)?).abs();
    let height = (coord(y1)? - coord(y0)?).abs();
    (width > 0.0 && height > 0.0).then_some(PageSize { width_pt: width, height_pt: height })
}

fn paint_paper(width: u32, height: u32, page_index: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, PAPER);
    if width < 4 || height < 4 {
        return image;
    }

    let band = band_shade(page_index);
    let band_rows = (height / 12).clamp(1, height - 2);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            *pixel = EDGE;
        } else if y <= band_rows {
            *pixel = band;
        }
    }

    image
}

fn band_shade(page_index: u32) -> Rgba<u8> {
    let shade = 120 + (page_index.wrapping_mul(37) % 100) as u8;
    Rgba([shade, shade, 200, 255])
}
