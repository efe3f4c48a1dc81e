//! Pixel geometry for page slots.
//!
//! Pages are fit to the width of their slot, then scaled by the zoom factor.
//! Backing stores are sized in device pixels so that one logical unit maps to
//! one CSS pixel at any density.

use flipbook_engine::PageSize;

/// Largest backing store edge, in device pixels.
pub const MAX_SURFACE_SIDE: u32 = 16_384;
/// Largest backing store area, in device pixels (256 MiB of RGBA).
pub const MAX_SURFACE_PIXELS: u32 = 1 << 26;

/// On-screen size of the viewer container, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Client size available to one page slot, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientSize {
    pub width: f32,
    pub height: f32,
}

impl ClientSize {
    /// A slot with no usable width renders nothing.
    pub fn is_degenerate(&self) -> bool {
        !is_usable(self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const ZERO: PixelSize = PixelSize { width: 0, height: 0 };

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn exceeds_surface_limit(&self) -> bool {
        self.width > MAX_SURFACE_SIDE
            || self.height > MAX_SURFACE_SIDE
            || self.width.checked_mul(self.height).map_or(true, |area| area > MAX_SURFACE_PIXELS)
    }
}

/// Fully resolved geometry for one page render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// CSS pixels per point
    pub scale: f32,
    pub css_width: f32,
    pub css_height: f32,
    /// Backing store size in device pixels
    pub pixels: PixelSize,
}

impl PageGeometry {
    pub fn is_degenerate(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Splits the container between the visible slots: half the width each in
/// double mode, full height either way.
pub fn per_page_client_size(container: ContainerSize, is_double: bool) -> ClientSize {
    let width = if is_double { container.width / 2.0 } else { container.width };
    ClientSize { width, height: container.height }
}

/// Fit width, then apply zoom.
pub fn fit_scale(intrinsic: PageSize, client_width: f32, zoom: f32) -> f32 {
    if !is_usable(intrinsic.width_pt) || !is_usable(client_width) {
        return 0.0;
    }
    (client_width / intrinsic.width_pt) * zoom
}

/// Device pixel size of the backing store. Sizes over the surface limit come
/// out empty.
pub fn backing_size(intrinsic: PageSize, scale: f32, density: f32) -> PixelSize {
    let (width, height) = intrinsic.scaled(scale);
    let pixels = PixelSize { width: device_px(width * density), height: device_px(height * density) };

    if pixels.exceeds_surface_limit() {
        tracing::warn!(width, height, density, "backing store over surface limit, rendering nothing");
        return PixelSize::ZERO;
    }
    pixels
}

pub fn resolve(intrinsic: PageSize, client: ClientSize, zoom: f32, density: f32) -> PageGeometry {
    if client.is_degenerate() {
        return PageGeometry { scale: 0.0, css_width: 0.0, css_height: 0.0, pixels: PixelSize::ZERO };
    }

    let scale = fit_scale(intrinsic, client.width, zoom);
    let (css_width, css_height) = intrinsic.scaled(scale);

    PageGeometry { scale, css_width, css_height, pixels: backing_size(intrinsic, scale, density) }
}

fn is_usable(length: f32) -> bool {
    length.is_finite() && length > 0.0
}

fn device_px(value: f32) -> u32 {
    if is_usable(value) {
        value.ceil() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

    #[test]
    fn double_mode_halves_width() {
        let container = ContainerSize::new(1200.0, 800.0);

        assert_eq!(
            per_page_client_size(container, true),
            ClientSize { width: 600.0, height: 800.0 }
        );
        assert_eq!(
            per_page_client_size(container, false),
            ClientSize { width: 1200.0, height: 800.0 }
        );
    }

    #[test]
    fn fit_scale_applies_zoom_after_fit() {
        let page = PageSize { width_pt: 500.0, height_pt: 700.0 };

        assert_eq!(fit_scale(page, 1000.0, 1.0), 2.0);
        assert_eq!(fit_scale(page, 1000.0, 1.5), 3.0);
    }

    #[test]
    fn backing_size_rounds_up_device_pixels() {
        let page = PageSize { width_pt: 100.0, height_pt: 150.0 };

        assert_eq!(backing_size(page, 1.0, 1.25), PixelSize { width: 125, height: 188 });
    }

    #[test]
    fn resolve_maps_css_size_and_density() {
        let geometry = resolve(LETTER, ClientSize { width: 306.0, height: 500.0 }, 1.0, 2.0);

        assert_eq!(geometry.scale, 0.5);
        assert_eq!(geometry.css_width, 306.0);
        assert_eq!(geometry.css_height, 396.0);
        assert_eq!(geometry.pixels, PixelSize { width: 612, height: 792 });
    }

    #[test]
    fn zero_width_container_is_degenerate() {
        let client = per_page_client_size(ContainerSize::new(0.0, 800.0), true);
        assert!(client.is_degenerate());

        let geometry = resolve(LETTER, client, 1.0, 1.0);
        assert!(geometry.is_degenerate());
        assert_eq!(geometry.pixels, PixelSize::ZERO);
    }

    #[test]
    fn zero_width_page_is_degenerate() {
        let page = PageSize { width_pt: 0.0, height_pt: 100.0 };
        let geometry = resolve(page, ClientSize { width: 400.0, height: 400.0 }, 1.0, 1.0);

        assert!(geometry.is_degenerate());
    }

    #[test]
    fn huge_zoom_is_degenerate() {
        let geometry = resolve(LETTER, ClientSize { width: 400.0, height: 400.0 }, 1.0e30, 1.0);

        assert!(geometry.is_degenerate());
        assert_eq!(geometry.pixels, PixelSize::ZERO);
    }

    #[test]
    fn surface_limit_covers_edge_and_area() {
        assert!(!PixelSize { width: MAX_SURFACE_SIDE, height: 4096 }.exceeds_surface_limit());
        assert!(PixelSize { width: MAX_SURFACE_SIDE + 1, height: 1 }.exceeds_surface_limit());
        assert!(PixelSize { width: MAX_SURFACE_SIDE, height: MAX_SURFACE_SIDE }.exceeds_surface_limit());
        assert!(PixelSize { width: u32::MAX, height: u32::MAX }.exceeds_surface_limit());

        let page = PageSize { width_pt: 100.0, height_pt: 100.0 };
        assert_eq!(backing_size(page, 200.0, 1.0), PixelSize::ZERO);
    }

    #[test]
    fn nan_width_is_degenerate() {
        assert!(ClientSize { width: f32::NAN, height: 10.0 }.is_degenerate());
    }
}
