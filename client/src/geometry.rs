/// Integer pixel-density multiplier for a device pixel ratio.
///
/// Fractional ratios round down (1.5 draws at 1x) and anything below 1,
/// including a NaN read from a broken environment, draws at 1x.
pub fn density_scale(device_pixel_ratio: f64) -> u32 {
    device_pixel_ratio.max(1.0).floor() as u32
}

/// CSS size and backing-buffer size of the rendering surface at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub css_width: u32,
    pub css_height: u32,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub device_pixel_ratio: f64,
}

impl CanvasGeometry {
    pub fn resolve(css_width: u32, css_height: u32, device_pixel_ratio: f64) -> Self {
        let density = density_scale(device_pixel_ratio);
        Self {
            css_width,
            css_height,
            buffer_width: css_width.saturating_mul(density).max(1),
            buffer_height: css_height.saturating_mul(density).max(1),
            device_pixel_ratio,
        }
    }

    /// Measured CSS lengths are fractional; the buffer works in whole pixels.
    pub fn from_measured(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self::resolve(
            css_width.max(0.0).round() as u32,
            css_height.max(0.0).round() as u32,
            device_pixel_ratio,
        )
    }

    pub fn density(&self) -> f64 {
        density_scale(self.device_pixel_ratio) as f64
    }
}
