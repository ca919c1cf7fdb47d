use crate::config::{INITIAL_ZOOM, ZOOM_CEILING, ZOOM_FLOOR};

/// Viewport manages the zoom/pan transformation from image coordinates to CSS pixels.
///
/// Translation is applied after scaling, so `pan_x`/`pan_y` live in the
/// already-zoomed coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: INITIAL_ZOOM,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    /// Multiply the zoom by `factor`, clamped to `[ZOOM_FLOOR, ZOOM_CEILING]`.
    /// Returns `false` when the clamped result is bit-identical to the current zoom.
    pub fn zoom(&mut self, factor: f64) -> bool {
        let new_zoom = (self.zoom * factor).clamp(ZOOM_FLOOR, ZOOM_CEILING);
        if new_zoom.to_bits() == self.zoom.to_bits() {
            return false;
        }
        self.zoom = new_zoom;
        true
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = INITIAL_ZOOM;
    }

    /// Convert image coordinates to CSS-pixel coordinates.
    pub fn image_to_screen(&self, ix: f64, iy: f64) -> (f64, f64) {
        ((ix + self.pan_x) * self.zoom, (iy + self.pan_y) * self.zoom)
    }

    /// Convert CSS-pixel coordinates to image coordinates.
    pub fn screen_to_image(&self, sx: f64, sy: f64) -> (f64, f64) {
        (sx / self.zoom - self.pan_x, sy / self.zoom - self.pan_y)
    }

    /// Transform for a backing buffer at the given density scale.
    pub fn draw_transform(&self, density: f64) -> DrawTransform {
        DrawTransform {
            density,
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        }
    }
}

/// Ordered drawing transform: `scale(density)`, `scale(zoom)`, `translate(pan)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawTransform {
    pub density: f64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl DrawTransform {
    /// Map image coordinates to backing-buffer pixels.
    pub fn apply(&self, ix: f64, iy: f64) -> (f64, f64) {
        let scale = self.density * self.zoom;
        ((ix + self.pan_x) * scale, (iy + self.pan_y) * scale)
    }
}
