use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement, ResizeObserver};

use crate::size::{LayoutBoxes, ResizeOrigin};

pub fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// The live host element and its canvas.
#[derive(Clone)]
pub struct DomLayout {
    pub host: HtmlElement,
    pub canvas: HtmlCanvasElement,
}

impl DomLayout {
    fn set_px(element: &HtmlElement, property: &str, value: f64) {
        let _ = element.style().set_property(property, &format!("{value}px"));
    }
}

impl LayoutBoxes for DomLayout {
    fn host_computed_size(&self) -> (String, String) {
        let computed = web_sys::window().and_then(|w| w.get_computed_style(&self.host).ok().flatten());
        let Some(style) = computed else {
            return (String::new(), String::new());
        };
        (
            style.get_property_value("width").unwrap_or_default(),
            style.get_property_value("height").unwrap_or_default(),
        )
    }

    fn surface_css_size(&self) -> (f64, f64) {
        (
            self.canvas.client_width() as f64,
            self.canvas.client_height() as f64,
        )
    }

    fn clear_surface_inline_size(&self) {
        let style = self.canvas.style();
        let _ = style.remove_property("width");
        let _ = style.remove_property("height");
    }

    fn set_surface_inline_size(&self, width: f64, height: f64) {
        Self::set_px(&self.canvas, "width", width);
        Self::set_px(&self.canvas, "height", height);
    }

    fn set_host_inline_width(&self, width: f64) {
        Self::set_px(&self.host, "width", width);
    }

    fn set_host_inline_height(&self, height: f64) {
        Self::set_px(&self.host, "height", height);
    }

    fn device_pixel_ratio(&self) -> f64 {
        device_pixel_ratio()
    }

    /// Setting width/height resets the 2D context, so untouched when unchanged.
    fn set_buffer_size(&self, width: u32, height: u32) {
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }
}

fn resize_observer_available(window: &web_sys::Window) -> bool {
    Reflect::get(window.as_ref(), &JsValue::from_str("ResizeObserver"))
        .map(|ctor| ctor.is_function())
        .unwrap_or(false)
}

/// Resize notifications for the host and canvas boxes, each tagged with its origin.
///
/// Without `ResizeObserver` the window `resize` event stands in, reporting
/// both origins. Everything is disconnected on drop.
pub enum SizeObservation {
    Observers {
        host: ResizeObserver,
        canvas: ResizeObserver,
        _callbacks: [Closure<dyn FnMut(js_sys::Array)>; 2],
    },
    WindowFallback {
        window: web_sys::Window,
        callback: Closure<dyn FnMut()>,
    },
}

impl SizeObservation {
    pub fn start(
        layout: &DomLayout,
        on_resize: impl Fn(ResizeOrigin) + Clone + 'static,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        if !resize_observer_available(&window) {
            web_sys::console::info_1(
                &"ResizeObserver unavailable; falling back to window resize events".into(),
            );
            let callback = Closure::<dyn FnMut()>::new(move || {
                on_resize(ResizeOrigin::Host);
                on_resize(ResizeOrigin::Canvas);
            });
            window.add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())?;
            return Ok(Self::WindowFallback { window, callback });
        }

        let on_host = on_resize.clone();
        let host_cb = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
            on_host(ResizeOrigin::Host);
        });
        let canvas_cb = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
            on_resize(ResizeOrigin::Canvas);
        });
        let host = ResizeObserver::new(host_cb.as_ref().unchecked_ref())?;
        let canvas = ResizeObserver::new(canvas_cb.as_ref().unchecked_ref())?;
        host.observe(&layout.host);
        canvas.observe(&layout.canvas);

        Ok(Self::Observers {
            host,
            canvas,
            _callbacks: [host_cb, canvas_cb],
        })
    }
}

impl Drop for SizeObservation {
    fn drop(&mut self) {
        match self {
            Self::Observers { host, canvas, .. } => {
                host.disconnect();
                canvas.disconnect();
            }
            Self::WindowFallback { window, callback } => {
                let _ = window
                    .remove_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
            }
        }
    }
}
