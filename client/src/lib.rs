#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

pub mod attributes;
pub mod config;
mod dom;
pub mod extensions;
pub mod geometry;
mod input;
pub mod loader;
pub mod registry;
mod render_loop;
pub mod renderer;
pub mod size;
pub mod state;
pub mod viewport;
pub mod widget;

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::config::{ELEMENT_NAME, OBSERVED_ATTRIBUTES};
use crate::registry::WidgetDefinition;
use crate::widget::{GameMap, WidgetLifecycle};

/// Handle the custom-element shim keeps per element; forwards lifecycle callbacks.
#[wasm_bindgen]
pub struct GameMapElement {
    widget: GameMap,
}

#[wasm_bindgen]
impl GameMapElement {
    #[wasm_bindgen(constructor)]
    pub fn new(host: HtmlElement) -> GameMapElement {
        GameMapElement {
            widget: GameMap::new(host),
        }
    }

    pub fn connected(&self) {
        self.widget.on_attach();
    }

    pub fn disconnected(&self) {
        self.widget.on_detach();
    }

    #[wasm_bindgen(js_name = attributeChanged)]
    pub fn attribute_changed(&self, name: &str, old: Option<String>, new: Option<String>) {
        self.widget
            .on_attribute_change(name, old.as_deref(), new.as_deref());
    }

    pub fn zoom(&self, factor: f64) {
        self.widget.zoom(factor);
    }

    /// Current zoom, sizing and buffer state as a plain JS object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.widget.state()).map_err(Into::into)
    }
}

/// Register `<game-map>` with the page. Safe to call more than once: later
/// calls report the conflict instead of redefining the element.
#[wasm_bindgen(js_name = defineGameMap)]
pub fn define_game_map() -> bool {
    let definition = WidgetDefinition {
        name: ELEMENT_NAME,
        observed_attributes: OBSERVED_ATTRIBUTES,
    };
    let create = Closure::<dyn FnMut(HtmlElement) -> JsValue>::new(|host: HtmlElement| {
        JsValue::from(GameMapElement::new(host))
    });
    match registry::define_element(definition, create) {
        Ok(()) => true,
        Err(err) => {
            web_sys::console::warn_1(&err.to_string().into());
            false
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    define_game_map();
}
