use std::cell::RefCell;
use std::rc::Rc;

use game_map_shared::MapInfo;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::geometry::CanvasGeometry;
use crate::loader::{LoadError, LoadGeneration};
use crate::size::LayoutBoxes;
use crate::state::MapState;
use crate::viewport::DrawTransform;

/// The 2D drawing calls one background frame needs.
pub trait Painter {
    type Image;

    fn clear(&self, width: f64, height: f64);
    fn save(&self);
    fn restore(&self);
    fn scale(&self, x: f64, y: f64);
    fn translate(&self, x: f64, y: f64);
    fn draw_image(&self, image: &Self::Image, x: f64, y: f64);
}

impl Painter for CanvasRenderingContext2d {
    type Image = HtmlImageElement;

    fn clear(&self, width: f64, height: f64) {
        self.clear_rect(0.0, 0.0, width, height);
    }

    fn save(&self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn scale(&self, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::scale(self, x, y);
    }

    fn translate(&self, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::translate(self, x, y);
    }

    fn draw_image(&self, image: &HtmlImageElement, x: f64, y: f64) {
        let _ = self.draw_image_with_html_image_element(image, x, y);
    }
}

/// Clear the buffer and draw `image` through `transform`.
///
/// `overlay` runs inside the same transformed state, after the background.
pub fn paint_background<P: Painter>(
    painter: &P,
    image: &P::Image,
    buffer: (u32, u32),
    transform: DrawTransform,
    overlay: impl FnOnce(&P),
) {
    painter.clear(buffer.0 as f64, buffer.1 as f64);
    painter.save();
    painter.scale(transform.density, transform.density);
    painter.scale(transform.zoom, transform.zoom);
    painter.translate(transform.pan_x, transform.pan_y);
    painter.draw_image(image, 0.0, 0.0);
    overlay(painter);
    painter.restore();
}

/// Run the image-ready steps of a frame in order: adopt the image size
/// (canvas mode only), size the backing buffer from the fresh CSS box, then
/// paint. Returns the geometry the frame was painted at.
pub fn present<B, P>(
    state: &mut MapState,
    boxes: &B,
    natural: (f64, f64),
    painter: &P,
    image: &P::Image,
    overlay: impl FnOnce(&P, &MapState),
) -> CanvasGeometry
where
    B: LayoutBoxes,
    P: Painter,
{
    state.image_ready(natural, boxes);
    let geometry = boxes.sync_backing_buffer();
    let transform = state.viewport.draw_transform(geometry.density());
    let state = &*state;
    paint_background(
        painter,
        image,
        (geometry.buffer_width, geometry.buffer_height),
        transform,
        |painter| overlay(painter, state),
    );
    geometry
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeRequest {
    /// Already decoded; hand it over now.
    Cached,
    /// The same source is being decoded; its completion will schedule the paint.
    Join,
    /// Start a decode tagged with this generation.
    Start(u64),
}

/// Bookkeeping for background decodes, kept apart from the browser types.
///
/// Asking for a different source supersedes whatever is in flight. Asking
/// again for the source already in flight joins it instead of restarting.
#[derive(Debug, Default)]
pub struct DecodeTracker {
    generation: LoadGeneration,
    cached: Option<String>,
    in_flight: Option<(String, u64)>,
}

impl DecodeTracker {
    pub fn request(&mut self, src: &str) -> DecodeRequest {
        if self.cached.as_deref() == Some(src) {
            self.generation.advance();
            self.in_flight = None;
            return DecodeRequest::Cached;
        }
        if let Some((pending, _)) = &self.in_flight
            && pending == src
        {
            return DecodeRequest::Join;
        }
        let token = self.generation.advance();
        self.in_flight = Some((src.to_owned(), token));
        DecodeRequest::Start(token)
    }

    /// Record the end of decode `token`. Returns false when it was superseded.
    pub fn complete(&mut self, token: u64, decoded: bool) -> bool {
        if !self.generation.is_current(token) {
            return false;
        }
        if let Some((src, _)) = self.in_flight.take()
            && decoded
        {
            self.cached = Some(src);
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Decodes background images and hands them back once ready.
#[derive(Default)]
pub struct Renderer {
    tracker: RefCell<DecodeTracker>,
    decoded: RefCell<Option<DecodedImage>>,
}

#[derive(Clone)]
pub struct DecodedImage {
    pub src: String,
    pub image: HtmlImageElement,
}

impl DecodedImage {
    pub fn natural_size(&self) -> (f64, f64) {
        (
            self.image.natural_width() as f64,
            self.image.natural_height() as f64,
        )
    }
}

impl Renderer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Start (or reuse) the decode of `info.image` and call `on_ready` with it.
    /// A background already decoded for the same source is handed over
    /// synchronously; a request for the source already decoding is dropped,
    /// since the running decode calls its own `on_ready`.
    pub fn draw_background(
        self: &Rc<Self>,
        info: &MapInfo,
        on_ready: impl FnOnce(DecodedImage) + 'static,
    ) {
        let request = self.tracker.borrow_mut().request(&info.image);
        let token = match request {
            DecodeRequest::Cached => {
                let decoded = self.decoded.borrow().clone();
                if let Some(decoded) = decoded {
                    on_ready(decoded);
                }
                return;
            }
            DecodeRequest::Join => return,
            DecodeRequest::Start(token) => token,
        };

        let src = info.image.clone();
        let renderer = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            let result = decode_image(&src).await;
            if !renderer.tracker.borrow_mut().complete(token, result.is_ok()) {
                return;
            }
            match result {
                Ok(image) => {
                    let decoded = DecodedImage { src, image };
                    *renderer.decoded.borrow_mut() = Some(decoded.clone());
                    on_ready(decoded);
                }
                Err(err) => {
                    web_sys::console::warn_1(&format!("Background image {src}: {err}").into());
                }
            }
        });
    }
}

async fn decode_image(src: &str) -> Result<HtmlImageElement, LoadError> {
    let image = HtmlImageElement::new().map_err(|e| LoadError::Image(format!("{e:?}")))?;
    image.set_src(src);
    JsFuture::from(image.decode())
        .await
        .map_err(|e| LoadError::Image(format!("{e:?}")))?;
    Ok(image)
}
