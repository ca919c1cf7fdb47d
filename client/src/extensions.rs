//! Hooks for waypoint markers and category filters. The widget ships inert
//! defaults; embedders supply real implementations.

use std::collections::HashSet;

use game_map_shared::{Category, MapData, Waypoint};
use web_sys::CanvasRenderingContext2d;

use crate::viewport::Viewport;

pub trait WaypointRenderer {
    /// Called after the background is drawn, inside its transformed drawing
    /// state, so `(x, y)` in image pixels lands on the background.
    fn render_waypoints(
        &self,
        ctx: &CanvasRenderingContext2d,
        waypoints: &[&Waypoint],
        viewport: &Viewport,
    );
}

pub trait FilterController {
    /// Called whenever new map data replaces the old.
    fn set_categories(&mut self, categories: &[Category]);
    fn is_visible(&self, category: &str) -> bool;
}

/// Draws nothing.
#[derive(Debug, Default)]
pub struct NoWaypoints;

impl WaypointRenderer for NoWaypoints {
    fn render_waypoints(&self, _: &CanvasRenderingContext2d, _: &[&Waypoint], _: &Viewport) {}
}

/// Shows every category.
#[derive(Debug, Default)]
pub struct ShowAll;

impl FilterController for ShowAll {
    fn set_categories(&mut self, _: &[Category]) {}

    fn is_visible(&self, _: &str) -> bool {
        true
    }
}

/// Hides an explicit set of category ids.
#[derive(Debug, Default)]
pub struct HiddenCategories {
    known: HashSet<String>,
    hidden: HashSet<String>,
}

impl HiddenCategories {
    pub fn hide(&mut self, id: &str) {
        self.hidden.insert(id.to_owned());
    }

    pub fn show(&mut self, id: &str) {
        self.hidden.remove(id);
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.known.contains(id)
    }
}

impl FilterController for HiddenCategories {
    fn set_categories(&mut self, categories: &[Category]) {
        self.known = categories.iter().map(|c| c.id.clone()).collect();
        let known = &self.known;
        self.hidden.retain(|id| known.contains(id));
    }

    fn is_visible(&self, category: &str) -> bool {
        !self.hidden.contains(category)
    }
}

pub fn visible_waypoints<'a>(data: &'a MapData, filter: &dyn FilterController) -> Vec<&'a Waypoint> {
    data.waypoints
        .iter()
        .filter(|w| filter.is_visible(&w.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use game_map_shared::{MapInfo, WaypointId};

    use super::*;

    fn category(id: &str) -> Category {
        Category {
            id: id.into(),
            name: id.to_uppercase(),
            icon: None,
            color: None,
        }
    }

    fn waypoint(id: i64, category: &str) -> Waypoint {
        Waypoint {
            id: WaypointId::Number(id),
            title: format!("wp {id}"),
            description: None,
            coords: [0.0, 0.0],
            category: category.into(),
        }
    }

    fn sample() -> MapData {
        MapData {
            map_info: MapInfo {
                image: "test.png".into(),
                dimensions: [1000.0, 800.0],
                attribution: None,
            },
            categories: vec![category("tower"), category("shrine")],
            waypoints: vec![waypoint(1, "tower"), waypoint(2, "shrine"), waypoint(3, "tower")],
        }
    }

    #[test]
    fn default_filter_shows_everything() {
        let data = sample();
        assert_eq!(visible_waypoints(&data, &ShowAll).len(), 3);
    }

    #[test]
    fn hidden_categories_drop_their_waypoints() {
        let data = sample();
        let mut filter = HiddenCategories::default();
        filter.set_categories(&data.categories);
        filter.hide("tower");

        let visible = visible_waypoints(&data, &filter);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].category, "shrine");

        filter.show("tower");
        assert_eq!(visible_waypoints(&data, &filter).len(), 3);
    }

    #[test]
    fn new_categories_forget_stale_hidden_ids() {
        let mut filter = HiddenCategories::default();
        filter.hide("tower");
        filter.hide("cave");
        filter.set_categories(&[category("tower")]);

        assert!(filter.is_known("tower"));
        assert!(!filter.is_visible("tower"));
        assert!(filter.is_visible("cave"));
    }
}
