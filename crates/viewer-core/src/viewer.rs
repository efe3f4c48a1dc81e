//! The mounted viewer: owns the document, drives layout transitions and
//! re-renders the spread after every state change.

use crate::config::{SingleMode, ViewerConfig};
use crate::error::{ViewerError, ViewerResult};
use crate::geometry::per_page_client_size;
use crate::host::{ContainerId, Host};
use crate::layout::{DisplayFlags, Layout, LayoutState, Spread};
use crate::navigation::{route, Command, ViewerEvent};
use crate::pipeline::{RenderParams, RenderPipeline, Slot, SlotSurface, BLANK_SLOT_SIZE};
use flipbook_cache::{CacheStats, Surface, SurfaceCache};
use flipbook_engine::{DocumentHandle, OpenSource, PdfEngine};
use flipbook_scheduler::runtime;

/// Placeholder surface shown over the spread during a turn gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOverlay {
    surface: Surface,
    visible: bool,
}

impl TurnOverlay {
    fn hidden() -> Self {
        Self { surface: Surface::blank(BLANK_SLOT_SIZE, BLANK_SLOT_SIZE), visible: false }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

/// Resolve the configured target on `host` and build a viewer around it.
///
/// Nothing is loaded yet; call [`Viewer::load`] or
/// [`Viewer::load_configured`].
pub fn mount<H, E>(config: ViewerConfig, mut host: H, engine: E) -> ViewerResult<Viewer<H, E>>
where
    H: Host,
    E: PdfEngine,
{
    config.validate()?;

    let target = config.target.clone().ok_or(ViewerError::MissingTarget)?;
    let container = host
        .resolve_target(&target)
        .ok_or_else(|| ViewerError::TargetNotFound(target.to_string()))?;

    let layout = Layout::new(config.single_mode(), config.breakpoint, host.viewport_width());
    let cache = SurfaceCache::from_config(&config.cache_config());
    tracing::info!(%target, single = layout.is_single(), "viewer mounted");

    Ok(Viewer {
        zoom: config.zoom,
        config,
        host,
        engine,
        container,
        document: None,
        layout,
        pipeline: RenderPipeline::new(cache),
        flags: DisplayFlags::default(),
        overlay: TurnOverlay::hidden(),
        render_count: 0,
    })
}

pub struct Viewer<H, E>
where
    H: Host,
    E: PdfEngine,
{
    config: ViewerConfig,
    host: H,
    engine: E,
    container: ContainerId,
    document: Option<DocumentHandle>,
    layout: Layout,
    pipeline: RenderPipeline,
    zoom: f32,
    flags: DisplayFlags,
    overlay: TurnOverlay,
    render_count: u64,
}

impl<H, E> Viewer<H, E>
where
    H: Host,
    E: PdfEngine + Sync,
{
    /// Open a document and show its cover. Returns the page count.
    ///
    /// On failure the viewer keeps whatever it showed before.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn load(&mut self, source: impl Into<OpenSource>) -> ViewerResult<u32> {
        let handle = self.engine.open(source.into())?;

        let total = match self.engine.page_count(handle) {
            Ok(0) => Err(ViewerError::EmptyDocument),
            Ok(total) => Ok(total),
            Err(err) => Err(ViewerError::Load(err)),
        };
        let total = match total {
            Ok(total) => total,
            Err(err) => {
                self.close_handle(handle);
                return Err(err);
            }
        };

        if let Some(previous) = self.document.replace(handle) {
            self.close_handle(previous);
        }
        self.pipeline.reset();
        self.layout.load(total, self.host.viewport_width());
        tracing::info!(total, single = self.layout.is_single(), "document loaded");

        self.render();
        Ok(total)
    }

    /// Load `pdf_url` from the configuration. Returns `false` when none is
    /// set.
    pub fn load_configured(&mut self) -> ViewerResult<bool> {
        let Some(path) = self.config.pdf_url.clone() else {
            return Ok(false);
        };
        self.load(path)?;
        Ok(true)
    }

    /// Render both slots for the current spread and present the results.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render(&mut self) {
        let (Some(document), Some(spread)) = (self.document, self.layout.visible_pages()) else {
            return;
        };

        let container = self.host.container_size(self.container);
        let params = RenderParams {
            document,
            client: per_page_client_size(container, self.layout.is_double()),
            zoom: self.zoom,
            device_pixel_ratio: self.host.device_pixel_ratio(),
        };

        let pipeline = &self.pipeline;
        let engine = &self.engine;
        let (left, right) = runtime::join(
            || pipeline.render_slot(engine, params, Slot::Left, spread.left),
            || pipeline.render_slot(engine, params, Slot::Right, Some(spread.right)),
        );

        self.pipeline.finish(left);
        self.pipeline.finish(right);
        self.flags = self.layout.flags();
        self.render_count += 1;
        tracing::debug!(?spread, flags = ?self.flags, "spread rendered");
    }

    pub fn next(&mut self) -> Option<u32> {
        let page = self.layout.next()?;
        tracing::debug!(page, "next");
        self.render();
        Some(page)
    }

    pub fn prev(&mut self) -> Option<u32> {
        let page = self.layout.prev()?;
        tracing::debug!(page, "prev");
        self.render();
        Some(page)
    }

    /// Show `page`, aligned to its spread in double mode.
    pub fn go_to(&mut self, page: u32) -> Option<u32> {
        let page = self.layout.go_to(page)?;
        tracing::debug!(page, "go_to");
        self.render();
        Some(page)
    }

    pub fn first(&mut self) -> Option<u32> {
        self.go_to(1)
    }

    pub fn last(&mut self) -> Option<u32> {
        let total = self.layout.total()?;
        self.go_to(total)
    }

    /// Pin single (`true`) or double (`false`) page mode.
    pub fn set_single(&mut self, single: bool) {
        self.set_single_mode(SingleMode::Fixed(single));
    }

    /// Pin a mode, or return to breakpoint-driven switching with
    /// [`SingleMode::Auto`].
    pub fn set_single_mode(&mut self, mode: SingleMode) {
        let changed = self.layout.set_single(mode, self.host.viewport_width());
        tracing::debug!(?mode, changed, "display mode set");
        self.render();
    }

    pub fn toggle_single(&mut self) {
        self.set_single(!self.layout.is_single());
    }

    /// Recompute the responsive mode and re-render. Returns `true` if the
    /// mode flipped.
    pub fn on_resize(&mut self) -> bool {
        let flipped = self.layout.on_resize(self.host.viewport_width());
        if flipped {
            tracing::debug!(single = self.layout.is_single(), "breakpoint crossed");
        }
        self.render();
        flipped
    }

    pub fn set_zoom(&mut self, zoom: f32) -> ViewerResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ViewerError::InvalidZoom(zoom));
        }
        self.zoom = zoom;
        self.render();
        Ok(())
    }

    pub fn enter_fullscreen(&mut self) {
        if !self.host.supports_fullscreen() {
            tracing::debug!("fullscreen unsupported");
            return;
        }
        if self.host.is_fullscreen() {
            return;
        }
        if let Err(err) = self.host.request_fullscreen(self.container) {
            tracing::warn!(%err, "fullscreen request failed");
        }
        self.process_host_events();
    }

    pub fn exit_fullscreen(&mut self) {
        if !self.host.supports_fullscreen() {
            tracing::debug!("fullscreen unsupported");
            return;
        }
        if !self.host.is_fullscreen() {
            return;
        }
        if let Err(err) = self.host.exit_fullscreen() {
            tracing::warn!(%err, "leaving fullscreen failed");
        }
        self.process_host_events();
    }

    pub fn toggle_fullscreen(&mut self) {
        if self.host.is_fullscreen() {
            self.exit_fullscreen();
        } else {
            self.enter_fullscreen();
        }
    }

    /// Handle every notification the host has queued. Returns how many
    /// were handled.
    pub fn process_host_events(&mut self) -> usize {
        let events = self.host.drain_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    pub fn handle_event(&mut self, event: ViewerEvent) -> Command {
        let command = route(event);
        match command {
            Command::Prev => {
                self.prev();
            }
            Command::Next => {
                self.next();
            }
            Command::First => {
                self.first();
            }
            Command::Last => {
                self.last();
            }
            Command::Resize => {
                self.on_resize();
            }
            Command::ToggleFullscreen => self.toggle_fullscreen(),
            Command::Rerender => self.render(),
        }
        command
    }

    /// Start a turn gesture. Navigation is ignored until [`Viewer::end_turn`].
    pub fn begin_turn(&mut self) -> bool {
        let started = self.layout.begin_turn();
        if started {
            self.overlay.visible = true;
        }
        started
    }

    pub fn end_turn(&mut self) {
        self.layout.end_turn();
        self.overlay.visible = false;
    }
}

impl<H, E> Viewer<H, E>
where
    H: Host,
    E: PdfEngine,
{
    fn close_handle(&mut self, handle: DocumentHandle) {
        if let Err(err) = self.engine.close(handle) {
            tracing::warn!(handle = handle.raw(), %err, "failed to close document");
        }
    }

    pub fn state(&self) -> LayoutState {
        self.layout.state()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn flags(&self) -> DisplayFlags {
        self.flags
    }

    pub fn visible_pages(&self) -> Option<Spread> {
        self.layout.visible_pages()
    }

    pub fn current_page(&self) -> Option<u32> {
        self.layout.current_right()
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.layout.total()
    }

    pub fn is_single(&self) -> bool {
        self.layout.is_single()
    }

    pub fn is_double(&self) -> bool {
        self.layout.is_double()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.host.is_fullscreen()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn slot(&self, slot: Slot) -> &SlotSurface {
        self.pipeline.slot(slot)
    }

    pub fn turn_overlay(&self) -> &TurnOverlay {
        &self.overlay
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.pipeline.cache().stats()
    }

    /// Completed spread renders since mount.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn document(&self) -> Option<DocumentHandle> {
        self.document
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<H, E> Drop for Viewer<H, E>
where
    H: Host,
    E: PdfEngine,
{
    fn drop(&mut self) {
        if let Some(handle) = self.document.take() {
            self.close_handle(handle);
        }
    }
}
