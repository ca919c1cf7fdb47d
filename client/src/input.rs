use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, HtmlCanvasElement, KeyboardEvent, WheelEvent};

use crate::config::ZOOM_STEP;

/// Wheel up zooms in; anything else, including a zero delta, zooms out.
pub fn zoom_factor_for_wheel(delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        ZOOM_STEP
    } else {
        1.0 / ZOOM_STEP
    }
}

pub fn zoom_factor_for_key(key: &str) -> Option<f64> {
    match key {
        "+" | "=" => Some(ZOOM_STEP),
        "-" | "_" => Some(1.0 / ZOOM_STEP),
        _ => None,
    }
}

/// Wheel and keyboard listeners on the canvas, removed when dropped.
pub struct InputBindings {
    canvas: HtmlCanvasElement,
    on_wheel: Closure<dyn FnMut(WheelEvent)>,
    on_keydown: Closure<dyn FnMut(KeyboardEvent)>,
}

impl InputBindings {
    /// Route zoom gestures on `canvas` to `zoom`, which receives the factor.
    pub fn attach(
        canvas: &HtmlCanvasElement,
        zoom: impl Fn(f64) + Clone + 'static,
    ) -> Result<Self, JsValue> {
        let zoom_wheel = zoom.clone();
        let on_wheel = Closure::<dyn FnMut(WheelEvent)>::new(move |e: WheelEvent| {
            e.prevent_default();
            zoom_wheel(zoom_factor_for_wheel(e.delta_y()));
        });
        let on_keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
            if let Some(factor) = zoom_factor_for_key(&e.key()) {
                e.prevent_default();
                zoom(factor);
            }
        });

        // Wheel must be non-passive so the page does not scroll underneath.
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        canvas.add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            on_wheel.as_ref().unchecked_ref(),
            &options,
        )?;
        canvas.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;
        canvas.set_attribute("tabindex", "0")?;

        Ok(Self {
            canvas: canvas.clone(),
            on_wheel,
            on_keydown,
        })
    }
}

impl Drop for InputBindings {
    fn drop(&mut self) {
        let _ = self
            .canvas
            .remove_event_listener_with_callback("wheel", self.on_wheel.as_ref().unchecked_ref());
        let _ = self.canvas.remove_event_listener_with_callback(
            "keydown",
            self.on_keydown.as_ref().unchecked_ref(),
        );
    }
}
