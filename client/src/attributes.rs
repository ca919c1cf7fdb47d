use game_map_shared::SizeSyncMode;

use crate::config::{
    ATTR_DATA_SRC, ATTR_DISABLE_PAN, ATTR_DISABLE_ZOOM, ATTR_INITIAL_X, ATTR_INITIAL_Y,
    ATTR_INITIAL_ZOOM, ATTR_SIZE_SYNC,
};

/// Typed value of one widget attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `None` for a missing or blank source.
    DataSource(Option<String>),
    SizeSync(SizeSyncMode),
    /// Declared attribute that is accepted but never consulted.
    Inert(Option<String>),
    Unknown,
}

pub fn normalize(name: &str, raw: Option<&str>) -> AttributeValue {
    match name {
        ATTR_DATA_SRC => AttributeValue::DataSource(
            raw.map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_owned),
        ),
        ATTR_SIZE_SYNC => AttributeValue::SizeSync(SizeSyncMode::normalize(raw)),
        ATTR_DISABLE_ZOOM | ATTR_DISABLE_PAN | ATTR_INITIAL_X | ATTR_INITIAL_Y
        | ATTR_INITIAL_ZOOM => AttributeValue::Inert(raw.map(str::to_owned)),
        _ => AttributeValue::Unknown,
    }
}

/// What the widget must do after an attribute mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeEffect {
    LoadData(String),
    /// Re-run both resize paths under the new mode.
    ResyncSize(SizeSyncMode),
    None,
}

/// Raw values of `disable-zoom`, `disable-pan`, `initial-x`, `initial-y`, `initial-zoom`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InertAttributes {
    pub disable_zoom: Option<String>,
    pub disable_pan: Option<String>,
    pub initial_x: Option<String>,
    pub initial_y: Option<String>,
    pub initial_zoom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetAttributes {
    pub size_sync: SizeSyncMode,
    pub data_src: Option<String>,
    pub inert: InertAttributes,
}

impl WidgetAttributes {
    pub fn apply(&mut self, name: &str, old: Option<&str>, new: Option<&str>) -> AttributeEffect {
        match normalize(name, new) {
            AttributeValue::DataSource(src) => {
                if old == new {
                    return AttributeEffect::None;
                }
                // A cleared source keeps whatever map is already loaded.
                let Some(src) = src else {
                    return AttributeEffect::None;
                };
                self.data_src = Some(src.clone());
                AttributeEffect::LoadData(src)
            }
            AttributeValue::SizeSync(mode) => {
                self.size_sync = mode;
                AttributeEffect::ResyncSize(mode)
            }
            AttributeValue::Inert(raw) => {
                let slot = match name {
                    ATTR_DISABLE_ZOOM => &mut self.inert.disable_zoom,
                    ATTR_DISABLE_PAN => &mut self.inert.disable_pan,
                    ATTR_INITIAL_X => &mut self.inert.initial_x,
                    ATTR_INITIAL_Y => &mut self.inert.initial_y,
                    _ => &mut self.inert.initial_zoom,
                };
                *slot = raw;
                AttributeEffect::None
            }
            AttributeValue::Unknown => AttributeEffect::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_sync_defaults_to_auto() {
        assert_eq!(WidgetAttributes::default().size_sync, SizeSyncMode::Auto);
    }

    #[test]
    fn size_sync_walks_through_modes() {
        let mut attrs = WidgetAttributes::default();
        assert_eq!(
            attrs.apply(ATTR_SIZE_SYNC, None, Some("host")),
            AttributeEffect::ResyncSize(SizeSyncMode::Host)
        );
        attrs.apply(ATTR_SIZE_SYNC, Some("host"), Some("canvas"));
        assert_eq!(attrs.size_sync, SizeSyncMode::Canvas);
        attrs.apply(ATTR_SIZE_SYNC, Some("canvas"), Some("none"));
        assert_eq!(attrs.size_sync, SizeSyncMode::None);
        attrs.apply(ATTR_SIZE_SYNC, Some("none"), Some("weird"));
        assert_eq!(attrs.size_sync, SizeSyncMode::Auto);
    }

    #[test]
    fn size_sync_is_case_insensitive() {
        assert_eq!(
            normalize(ATTR_SIZE_SYNC, Some("HOST")),
            AttributeValue::SizeSync(SizeSyncMode::Host)
        );
        assert_eq!(
            normalize(ATTR_SIZE_SYNC, Some("bogus")),
            AttributeValue::SizeSync(SizeSyncMode::Auto)
        );
        assert_eq!(
            normalize(ATTR_SIZE_SYNC, None),
            AttributeValue::SizeSync(SizeSyncMode::Auto)
        );
    }

    #[test]
    fn data_src_change_requests_load() {
        let mut attrs = WidgetAttributes::default();
        assert_eq!(
            attrs.apply(ATTR_DATA_SRC, None, Some("maps/world.json")),
            AttributeEffect::LoadData("maps/world.json".into())
        );
        assert_eq!(attrs.data_src.as_deref(), Some("maps/world.json"));
    }

    #[test]
    fn unchanged_data_src_is_ignored() {
        let mut attrs = WidgetAttributes::default();
        assert_eq!(
            attrs.apply(ATTR_DATA_SRC, Some("a.json"), Some("a.json")),
            AttributeEffect::None
        );
    }

    #[test]
    fn cleared_data_src_keeps_previous_source() {
        let mut attrs = WidgetAttributes::default();
        attrs.apply(ATTR_DATA_SRC, None, Some("a.json"));
        assert_eq!(attrs.apply(ATTR_DATA_SRC, Some("a.json"), None), AttributeEffect::None);
        assert_eq!(attrs.apply(ATTR_DATA_SRC, Some("a.json"), Some("")), AttributeEffect::None);
        assert_eq!(attrs.data_src.as_deref(), Some("a.json"));
    }

    #[test]
    fn inert_attributes_are_recorded_only() {
        let mut attrs = WidgetAttributes::default();
        assert_eq!(
            attrs.apply(ATTR_INITIAL_ZOOM, None, Some("3")),
            AttributeEffect::None
        );
        attrs.apply(ATTR_DISABLE_ZOOM, None, Some(""));
        assert_eq!(attrs.inert.initial_zoom.as_deref(), Some("3"));
        assert_eq!(attrs.inert.disable_zoom.as_deref(), Some(""));
        assert_eq!(attrs.size_sync, SizeSyncMode::Auto);
    }

    #[test]
    fn unknown_attribute_has_no_effect() {
        let mut attrs = WidgetAttributes::default();
        assert_eq!(attrs.apply("class", None, Some("big")), AttributeEffect::None);
        assert_eq!(attrs, WidgetAttributes::default());
    }
}
