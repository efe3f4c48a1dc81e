//! Render pipeline: resolves geometry for a page, fetches or rasterizes its
//! surface through the cache and presents it into a slot.

use crate::geometry::{self, ClientSize, PageGeometry};
use flipbook_cache::{clamp_density, Surface, SurfaceCache, SurfaceKey};
use flipbook_engine::{DocumentHandle, PdfEngine, RenderRequest};
use flipbook_scheduler::{CancellationToken, SupersessionRegistry};
use std::sync::Arc;

/// Size of the placeholder a cleared slot shows.
pub const BLANK_SLOT_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Left,
    Right,
}

/// How the slot's surface is sized on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDisplay {
    /// Stretched to 100% of the slot
    Fill,
    /// Cleared placeholder
    Blank,
}

/// What a slot currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSurface {
    page: Option<u32>,
    surface: Surface,
    display: SlotDisplay,
}

impl SlotSurface {
    pub fn cleared() -> Self {
        Self {
            page: None,
            surface: Surface::blank(BLANK_SLOT_SIZE, BLANK_SLOT_SIZE),
            display: SlotDisplay::Blank,
        }
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn display(&self) -> SlotDisplay {
        self.display
    }

    pub fn is_cleared(&self) -> bool {
        self.page.is_none()
    }
}

impl Default for SlotSurface {
    fn default() -> Self {
        Self::cleared()
    }
}

/// A finished slot render waiting to be presented.
#[derive(Debug)]
pub struct SlotRender {
    pub slot: Slot,
    pub page: Option<u32>,
    pub surface: Option<Arc<Surface>>,
    token: CancellationToken,
}

/// Inputs shared by both slots of one spread render.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    pub document: DocumentHandle,
    pub client: ClientSize,
    pub zoom: f32,
    /// Raw device pixel ratio; clamped before use
    pub device_pixel_ratio: f32,
}

#[derive(Debug)]
pub struct RenderPipeline {
    cache: SurfaceCache,
    tokens: SupersessionRegistry<Slot>,
    left: SlotSurface,
    right: SlotSurface,
}

impl RenderPipeline {
    pub fn new(cache: SurfaceCache) -> Self {
        Self {
            cache,
            tokens: SupersessionRegistry::new(),
            left: SlotSurface::cleared(),
            right: SlotSurface::cleared(),
        }
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    pub fn slot(&self, slot: Slot) -> &SlotSurface {
        match slot {
            Slot::Left => &self.left,
            Slot::Right => &self.right,
        }
    }

    /// Surface for one-based `page`, rendered on a cache miss.
    ///
    /// Pages that resolve to no pixels (a degenerate client, an unsizable or
    /// zero-width page, or a backing store over the surface limit) yield an
    /// empty surface without touching the cache. Render failures are logged
    /// and the blank surface allocated for the page is cached in place of
    /// the output.
    #[tracing::instrument(level = "debug", skip(self, engine, params), fields(zoom = params.zoom))]
    pub fn render_page<E>(&self, engine: &E, params: RenderParams, page: u32) -> Arc<Surface>
    where
        E: PdfEngine + ?Sized,
    {
        if params.client.is_degenerate() || page == 0 {
            return Arc::new(Surface::blank(0, 0));
        }

        let density = clamp_density(params.device_pixel_ratio);
        let intrinsic = match engine.page_size(params.document, page - 1) {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(page, %err, "cannot size page");
                return Arc::new(Surface::blank(0, 0));
            }
        };

        let geometry = geometry::resolve(intrinsic, params.client, params.zoom, density);
        if geometry.is_degenerate() {
            return Arc::new(Surface::blank(0, 0));
        }

        let key = SurfaceKey::new(
            page,
            params.client.width,
            params.client.height,
            params.zoom,
            density,
        );

        self.cache.get_or_render(key, || rasterize(engine, params.document, page, geometry, density))
    }

    /// Render the page for `slot` under a fresh token, superseding any
    /// render still outstanding for that slot.
    pub fn render_slot<E>(
        &self,
        engine: &E,
        params: RenderParams,
        slot: Slot,
        page: Option<u32>,
    ) -> SlotRender
    where
        E: PdfEngine + ?Sized,
    {
        let token = self.tokens.issue(slot);
        let surface = page.map(|page| self.render_page(engine, params, page));
        SlotRender { slot, page, surface, token }
    }

    /// Present a finished render unless a newer one replaced it. Returns
    /// whether the slot changed.
    ///
    /// [`Viewer`](crate::Viewer) finishes each render straight after issuing
    /// it, so its renders are never superseded. Supersession only drops
    /// results for hosts that run [`render_slot`](Self::render_slot) off
    /// thread and finish renders out of order.
    pub fn finish(&mut self, render: SlotRender) -> bool {
        if !self.tokens.complete(render.slot, &render.token) {
            tracing::debug!(slot = ?render.slot, page = ?render.page, "dropping superseded render");
            return false;
        }

        self.present(render.slot, render.page, render.surface.as_deref());
        true
    }

    /// Copy `surface` into `slot` at 1:1, or clear the slot when there is no
    /// page to show.
    pub fn present(&mut self, slot: Slot, page: Option<u32>, surface: Option<&Surface>) {
        let presented = match (page, surface) {
            (Some(page), Some(surface)) => {
                SlotSurface { page: Some(page), surface: surface.clone(), display: SlotDisplay::Fill }
            }
            _ => SlotSurface::cleared(),
        };

        match slot {
            Slot::Left => self.left = presented,
            Slot::Right => self.right = presented,
        }
    }

    /// Drop every cached surface, cancel outstanding renders and clear both
    /// slots.
    pub fn reset(&mut self) {
        let cancelled = self.tokens.cancel_all();
        self.cache.clear();
        self.left = SlotSurface::cleared();
        self.right = SlotSurface::cleared();
        tracing::debug!(cancelled, "render pipeline reset");
    }
}

fn rasterize<E>(
    engine: &E,
    document: DocumentHandle,
    page: u32,
    geometry: PageGeometry,
    density: f32,
) -> Surface
where
    E: PdfEngine + ?Sized,
{
    let mut surface = Surface::blank(geometry.pixels.width, geometry.pixels.height);
    let request = RenderRequest { page_index: page - 1, scale: geometry.scale * density };

    match engine.render_page(document, request) {
        Ok(raster) => image::imageops::replace(surface.pixels_mut(), &raster, 0, 0),
        Err(err) => tracing::warn!(page, %err, "page render failed, keeping blank surface"),
    }

    surface
}
