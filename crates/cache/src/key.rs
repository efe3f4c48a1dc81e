//! Geometry keys for rendered surfaces

/// Lower bound for the device pixel density used in keys and rendering
pub const MIN_DENSITY: f32 = 1.0;

/// Upper bound for the device pixel density used in keys and rendering
pub const MAX_DENSITY: f32 = 2.5;

/// Clamp a reported device pixel ratio to `[MIN_DENSITY, MAX_DENSITY]`.
///
/// Non-finite ratios fall back to `MIN_DENSITY`.
pub fn clamp_density(device_pixel_ratio: f32) -> f32 {
    if !device_pixel_ratio.is_finite() {
        return MIN_DENSITY;
    }
    device_pixel_ratio.clamp(MIN_DENSITY, MAX_DENSITY)
}

/// Identifies one rendered surface
///
/// Two requests that quantize to the same key are served by the same
/// surface. Widths and heights are in device pixels (floored), zoom and
/// density are stored in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceKey {
    /// One-based page number
    pub page: u32,

    /// `floor(client_width * density)`
    pub width_px: u32,

    /// `floor(client_height * density)`
    pub height_px: u32,

    /// Zoom rounded to two decimal places, times 100
    pub zoom_centi: u32,

    /// Clamped density rounded to two decimal places, times 100
    pub density_centi: u32,
}

impl SurfaceKey {
    /// Build a key from a page's client (CSS pixel) slot size
    pub fn new(page: u32, client_width: f32, client_height: f32, zoom: f32, density: f32) -> Self {
        let density = clamp_density(density);

        Self {
            page,
            width_px: floor_px(client_width * density),
            height_px: floor_px(client_height * density),
            zoom_centi: hundredths(zoom),
            density_centi: hundredths(density),
        }
    }

    /// Zoom factor this key was quantized from
    pub fn zoom(&self) -> f32 {
        self.zoom_centi as f32 / 100.0
    }

    /// Clamped density this key was quantized from
    pub fn density(&self) -> f32 {
        self.density_centi as f32 / 100.0
    }
}

impl std::fmt::Display for SurfaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}x{}@z{:.2}/d{:.2}",
            self.page,
            self.width_px,
            self.height_px,
            self.zoom(),
            self.density()
        )
    }
}

// `as` saturates: NaN and negatives become 0.
fn floor_px(value: f32) -> u32 {
    value.floor() as u32
}

fn hundredths(value: f32) -> u32 {
    (value * 100.0).round() as u32
}
