use std::cell::RefCell;
use std::collections::HashSet;

use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("custom element `{0}` is already defined")]
    AlreadyDefined(String),
    #[error("custom element registry rejected `{0}`")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetDefinition {
    pub name: &'static str,
    pub observed_attributes: &'static [&'static str],
}

/// Tag names this process has defined. The first definition of a name wins.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    names: HashSet<&'static str>,
}

impl WidgetRegistry {
    /// Run `install` for a name not yet defined and record it only once
    /// `install` reports that the browser accepted it.
    pub fn define_with(
        &mut self,
        definition: WidgetDefinition,
        install: impl FnOnce(&WidgetDefinition) -> bool,
    ) -> Result<(), RegistryError> {
        if self.names.contains(definition.name) {
            return Err(RegistryError::AlreadyDefined(definition.name.to_owned()));
        }
        if !install(&definition) {
            return Err(RegistryError::Rejected(definition.name.to_owned()));
        }
        self.names.insert(definition.name);
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

thread_local! {
    static REGISTRY: RefCell<WidgetRegistry> = RefCell::new(WidgetRegistry::default());
}

/// Install the browser element class for `definition`, whose lifecycle
/// callbacks forward to the object built by `create`, and record the name.
pub fn define_element(
    definition: WidgetDefinition,
    create: Closure<dyn FnMut(web_sys::HtmlElement) -> JsValue>,
) -> Result<(), RegistryError> {
    REGISTRY.with(|registry| {
        registry.borrow_mut().define_with(definition, |definition| {
            let observed: js_sys::Array = definition
                .observed_attributes
                .iter()
                .map(|name| JsValue::from_str(name))
                .collect();
            define_custom_element(definition.name, &observed, &create.into_js_value())
        })
    })
}

#[wasm_bindgen(inline_js = r#"
export function define_custom_element(name, observed, create) {
    if (customElements.get(name)) {
        return false;
    }
    customElements.define(name, class extends HTMLElement {
        static get observedAttributes() {
            return observed;
        }
        constructor() {
            super();
            this.__widget = create(this);
        }
        connectedCallback() {
            this.__widget.connected();
        }
        disconnectedCallback() {
            this.__widget.disconnected();
        }
        attributeChangedCallback(name, oldValue, newValue) {
            this.__widget.attributeChanged(name, oldValue, newValue);
        }
    });
    return true;
}
"#)]
extern "C" {
    fn define_custom_element(name: &str, observed: &js_sys::Array, create: &JsValue) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: WidgetDefinition = WidgetDefinition {
        name: "game-map",
        observed_attributes: &["data-src"],
    };

    #[test]
    fn first_definition_wins() {
        let mut registry = WidgetRegistry::default();
        registry.define_with(FIRST, |_| true).expect("first definition");

        let second = WidgetDefinition {
            name: "game-map",
            observed_attributes: &["size-sync"],
        };
        let mut installed = false;
        let result = registry.define_with(second, |_| {
            installed = true;
            true
        });
        assert_eq!(result, Err(RegistryError::AlreadyDefined("game-map".into())));
        assert!(!installed);
    }

    #[test]
    fn distinct_names_coexist() {
        let mut registry = WidgetRegistry::default();
        registry.define_with(FIRST, |_| true).expect("first definition");
        registry
            .define_with(
                WidgetDefinition {
                    name: "game-minimap",
                    observed_attributes: &[],
                },
                |_| true,
            )
            .expect("second name");
        assert!(registry.is_defined("game-map"));
        assert!(registry.is_defined("game-minimap"));
        assert!(!registry.is_defined("other"));
    }

    #[test]
    fn rejected_name_is_not_recorded() {
        let mut registry = WidgetRegistry::default();

        assert_eq!(
            registry.define_with(FIRST, |_| false),
            Err(RegistryError::Rejected("game-map".into()))
        );
        assert!(!registry.is_defined("game-map"));

        registry
            .define_with(FIRST, |definition| definition.name == "game-map")
            .expect("retry after rejection");
        assert!(registry.is_defined("game-map"));
    }
}
