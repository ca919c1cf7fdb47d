//! Sizing authority between the host element and the canvas it contains.
//!
//! Every resize notification is tagged with where it came from. The declared
//! [`SizeSyncMode`] plus the host's current computed size decide who wins, and
//! the winner's CSS box is pushed onto the loser.

use game_map_shared::SizeSyncMode;

use crate::geometry::CanvasGeometry;

/// Resolved sizing authority. `Auto` never survives resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveMode {
    Host,
    Canvas,
    None,
}

/// Which observed box reported the resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOrigin {
    Host,
    Canvas,
}

/// What the last authoritative resize did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Host,
    Canvas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Sizing is frozen; nothing to redraw.
    Frozen,
    /// Canvas inline size cleared so it fills the host.
    HostDriven,
    /// Canvas box copied onto the host.
    CanvasDriven,
    /// No authority change, but the backing buffer may be stale.
    Passive,
}

impl ResizeOutcome {
    pub fn needs_redraw(self) -> bool {
        !matches!(self, ResizeOutcome::Frozen)
    }
}

pub fn resolve_effective_mode(mode: SizeSyncMode, host_has_explicit_size: bool) -> EffectiveMode {
    match mode {
        SizeSyncMode::Host => EffectiveMode::Host,
        SizeSyncMode::Canvas => EffectiveMode::Canvas,
        SizeSyncMode::None => EffectiveMode::None,
        SizeSyncMode::Auto if host_has_explicit_size => EffectiveMode::Host,
        SizeSyncMode::Auto => EffectiveMode::Canvas,
    }
}

/// Positive length from a computed-style value. `auto`, blanks, percentages
/// that failed to resolve and non-positive lengths all count as absent.
pub fn explicit_length(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("auto") {
        return None;
    }
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|px| px.is_finite() && *px > 0.0)
}

pub fn has_explicit_size(width: &str, height: &str) -> bool {
    explicit_length(width).is_some() || explicit_length(height).is_some()
}

/// The two CSS boxes the resolver reads and writes.
pub trait LayoutBoxes {
    /// Computed `(width, height)` style values of the host.
    fn host_computed_size(&self) -> (String, String);
    /// Current CSS box size of the canvas.
    fn surface_css_size(&self) -> (f64, f64);
    fn clear_surface_inline_size(&self);
    fn set_surface_inline_size(&self, width: f64, height: f64);
    fn set_host_inline_width(&self, width: f64);
    fn set_host_inline_height(&self, height: f64);
    /// Read fresh on every call; the ratio changes when a window moves between displays.
    fn device_pixel_ratio(&self) -> f64;
    fn set_buffer_size(&self, width: u32, height: u32);

    fn host_has_explicit_size(&self) -> bool {
        let (width, height) = self.host_computed_size();
        has_explicit_size(&width, &height)
    }

    /// Match the backing buffer to the canvas CSS box at the current DPR.
    fn sync_backing_buffer(&self) -> CanvasGeometry {
        let (css_width, css_height) = self.surface_css_size();
        let geometry =
            CanvasGeometry::from_measured(css_width, css_height, self.device_pixel_ratio());
        self.set_buffer_size(geometry.buffer_width, geometry.buffer_height);
        geometry
    }
}

#[derive(Debug, Clone, Default)]
pub struct SizeResolver {
    last_source: Option<LayoutSource>,
}

impl SizeResolver {
    pub fn last_source(&self) -> Option<LayoutSource> {
        self.last_source
    }

    pub fn effective_mode(&self, mode: SizeSyncMode, boxes: &impl LayoutBoxes) -> EffectiveMode {
        resolve_effective_mode(mode, boxes.host_has_explicit_size())
    }

    pub fn handle_resize(
        &mut self,
        mode: SizeSyncMode,
        origin: ResizeOrigin,
        boxes: &impl LayoutBoxes,
    ) -> ResizeOutcome {
        let auto = mode == SizeSyncMode::Auto;
        match (self.effective_mode(mode, boxes), origin) {
            (EffectiveMode::None, _) => ResizeOutcome::Frozen,
            (EffectiveMode::Host, ResizeOrigin::Host) => self.follow_host(boxes),
            (EffectiveMode::Host, _) if auto => self.follow_host(boxes),
            (EffectiveMode::Canvas, ResizeOrigin::Canvas) => self.follow_canvas(boxes),
            (EffectiveMode::Canvas, _) if auto => self.follow_canvas(boxes),
            _ => ResizeOutcome::Passive,
        }
    }

    /// Size the canvas to a decoded background when the canvas is the
    /// authority, then carry that size up to the host. Returns `false` when
    /// host-driven (or frozen) sizing left everything untouched.
    pub fn adopt_image_size(
        &mut self,
        mode: SizeSyncMode,
        natural_width: f64,
        natural_height: f64,
        boxes: &impl LayoutBoxes,
    ) -> bool {
        if self.effective_mode(mode, boxes) != EffectiveMode::Canvas {
            return false;
        }
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return false;
        }
        boxes.set_surface_inline_size(natural_width, natural_height);
        self.follow_canvas(boxes);
        true
    }

    fn follow_host(&mut self, boxes: &impl LayoutBoxes) -> ResizeOutcome {
        boxes.clear_surface_inline_size();
        self.last_source = Some(LayoutSource::Host);
        ResizeOutcome::HostDriven
    }

    fn follow_canvas(&mut self, boxes: &impl LayoutBoxes) -> ResizeOutcome {
        let (width, height) = boxes.surface_css_size();
        if width > 0.0 {
            boxes.set_host_inline_width(width);
        }
        if height > 0.0 {
            boxes.set_host_inline_height(height);
        }
        self.last_source = Some(LayoutSource::Canvas);
        ResizeOutcome::CanvasDriven
    }
}
