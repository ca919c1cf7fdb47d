use game_map_shared::{MapData, MapInfo, SizeSyncMode};

use crate::attributes::{AttributeEffect, WidgetAttributes};
use crate::extensions::{FilterController, ShowAll};
use crate::loader::{LoadError, LoadGeneration};
use crate::size::{EffectiveMode, LayoutBoxes, ResizeOrigin, SizeResolver};
use crate::viewport::Viewport;

/// Kind of repaint a state change calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Redraw {
    None,
    Draw,
    /// Resynchronize the backing buffer, then draw.
    Resize,
}

impl Redraw {
    pub fn merge(self, other: Redraw) -> Redraw {
        self.max(other)
    }
}

/// How a finished `data-src` load was handled.
#[derive(Debug)]
pub enum LoadCompletion {
    Applied(Redraw),
    /// A newer `data-src` was requested meanwhile; the result is dropped.
    Superseded,
    /// Finished while detached; dropped and re-requested on the next attach.
    Detached,
    Failed(LoadError),
}

/// Everything a widget instance knows, independent of the DOM it is attached to.
pub struct MapState {
    pub attributes: WidgetAttributes,
    pub viewport: Viewport,
    pub resolver: SizeResolver,
    map_data: Option<MapData>,
    filter: Box<dyn FilterController>,
    data_generation: LoadGeneration,
    reload_on_attach: bool,
}

impl Default for MapState {
    fn default() -> Self {
        Self::with_filter(Box::new(ShowAll))
    }
}

impl MapState {
    pub fn with_filter(filter: Box<dyn FilterController>) -> Self {
        Self {
            attributes: WidgetAttributes::default(),
            viewport: Viewport::default(),
            resolver: SizeResolver::default(),
            map_data: None,
            filter,
            data_generation: LoadGeneration::default(),
            reload_on_attach: false,
        }
    }

    pub fn size_sync(&self) -> SizeSyncMode {
        self.attributes.size_sync
    }

    pub fn map_data(&self) -> Option<&MapData> {
        self.map_data.as_ref()
    }

    pub fn map_info(&self) -> Option<&MapInfo> {
        self.map_data.as_ref().map(|data| &data.map_info)
    }

    pub fn filter(&self) -> &dyn FilterController {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, mut filter: Box<dyn FilterController>) {
        if let Some(data) = &self.map_data {
            filter.set_categories(&data.categories);
        }
        self.filter = filter;
    }

    pub fn apply_attribute(
        &mut self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> AttributeEffect {
        self.attributes.apply(name, old, new)
    }

    pub fn zoom(&mut self, factor: f64) -> Redraw {
        if self.viewport.zoom(factor) {
            Redraw::Draw
        } else {
            Redraw::None
        }
    }

    /// Replace the map wholesale and start again from the initial zoom.
    pub fn accept_data(&mut self, data: MapData) -> Redraw {
        self.filter.set_categories(&data.categories);
        self.viewport.reset_zoom();
        self.map_data = Some(data);
        Redraw::Draw
    }

    /// Token for a `data-src` load about to start. Supersedes earlier loads.
    pub fn begin_load(&mut self) -> u64 {
        self.reload_on_attach = false;
        self.data_generation.advance()
    }

    pub fn finish_load(
        &mut self,
        token: u64,
        attached: bool,
        result: Result<MapData, LoadError>,
    ) -> LoadCompletion {
        if !self.data_generation.is_current(token) {
            return LoadCompletion::Superseded;
        }
        match result {
            Err(err) => LoadCompletion::Failed(err),
            Ok(_) if !attached => {
                self.reload_on_attach = true;
                LoadCompletion::Detached
            }
            Ok(data) => LoadCompletion::Applied(self.accept_data(data)),
        }
    }

    /// Source to fetch again on attach because its result landed while detached.
    pub fn take_reload_source(&mut self) -> Option<String> {
        if !std::mem::take(&mut self.reload_on_attach) {
            return None;
        }
        self.attributes.data_src.clone()
    }

    pub fn resize(&mut self, origin: ResizeOrigin, boxes: &impl LayoutBoxes) -> Redraw {
        if self
            .resolver
            .handle_resize(self.attributes.size_sync, origin, boxes)
            .needs_redraw()
        {
            Redraw::Resize
        } else {
            Redraw::None
        }
    }

    /// Re-run both resize paths, as after a `size-sync` change.
    pub fn resync(&mut self, boxes: &impl LayoutBoxes) -> Redraw {
        let host = self.resize(ResizeOrigin::Host, boxes);
        host.merge(self.resize(ResizeOrigin::Canvas, boxes))
    }

    pub fn effective_mode(&self, boxes: &impl LayoutBoxes) -> EffectiveMode {
        self.resolver.effective_mode(self.attributes.size_sync, boxes)
    }

    /// A background finished decoding at its natural size.
    pub fn image_ready(&mut self, natural: (f64, f64), boxes: &impl LayoutBoxes) -> bool {
        self.resolver
            .adopt_image_size(self.attributes.size_sync, natural.0, natural.1, boxes)
    }
}

#[cfg(test)]
mod tests {
    use game_map_shared::{Category, Waypoint, WaypointId};

    use super::*;
    use crate::config::{ATTR_DATA_SRC, ATTR_SIZE_SYNC};
    use crate::extensions::{HiddenCategories, visible_waypoints};
    use crate::size::LayoutSource;
    use crate::size::tests::FakeBoxes;

    fn sample(image: &str) -> MapData {
        MapData {
            map_info: MapInfo {
                image: image.into(),
                dimensions: [1000.0, 800.0],
                attribution: None,
            },
            categories: vec![Category {
                id: "tower".into(),
                name: "Towers".into(),
                icon: None,
                color: None,
            }],
            waypoints: vec![Waypoint {
                id: WaypointId::Number(1),
                title: "Test Tower".into(),
                description: None,
                coords: [500.0, 400.0],
                category: "tower".into(),
            }],
        }
    }

    #[test]
    fn zoom_change_requests_one_draw() {
        let mut state = MapState::default();
        state.accept_data(sample("test.png"));
        assert_eq!(state.zoom(1.1), Redraw::Draw);
        assert_eq!(state.viewport.zoom, 1.1);
    }

    #[test]
    fn clamped_zoom_requests_nothing() {
        let mut state = MapState::default();
        state.viewport.zoom = 5.0;
        assert_eq!(state.zoom(2.0), Redraw::None);
        assert_eq!(state.viewport.zoom, 5.0);

        state.viewport.zoom = 1.0;
        assert_eq!(state.zoom(0.5), Redraw::None);
        assert_eq!(state.zoom(1.0), Redraw::None);
    }

    #[test]
    fn new_data_resets_zoom() {
        let mut state = MapState::default();
        state.viewport.zoom = 3.0;
        assert_eq!(state.accept_data(sample("a.png")), Redraw::Draw);
        assert_eq!(state.viewport.zoom, 1.0);
        assert_eq!(state.map_info().map(|i| i.image.as_str()), Some("a.png"));

        state.accept_data(sample("b.png"));
        assert_eq!(state.map_info().map(|i| i.image.as_str()), Some("b.png"));
    }

    #[test]
    fn data_src_effect_surfaces_load() {
        let mut state = MapState::default();
        assert_eq!(
            state.apply_attribute(ATTR_DATA_SRC, None, Some("map.json")),
            AttributeEffect::LoadData("map.json".into())
        );
        assert!(state.map_data().is_none());
    }

    #[test]
    fn size_sync_change_resyncs_both_paths() {
        let boxes = FakeBoxes::new(("500px", "400px"), (300.0, 150.0));
        let mut state = MapState::default();
        assert_eq!(
            state.apply_attribute(ATTR_SIZE_SYNC, None, Some("HOST")),
            AttributeEffect::ResyncSize(SizeSyncMode::Host)
        );

        assert_eq!(state.resync(&boxes), Redraw::Resize);
        assert_eq!(state.resolver.last_source(), Some(LayoutSource::Host));
        assert_eq!(*boxes.clears.borrow(), 1);
    }

    #[test]
    fn frozen_sizing_requests_no_redraw() {
        let boxes = FakeBoxes::new(("500px", "400px"), (300.0, 150.0));
        let mut state = MapState::default();
        state.apply_attribute(ATTR_SIZE_SYNC, None, Some("none"));
        assert_eq!(state.resync(&boxes), Redraw::None);
    }

    #[test]
    fn auto_with_sized_host_resolves_host() {
        let boxes = FakeBoxes::new(("500px", "400px"), (300.0, 150.0));
        boxes.set_surface_inline_size(1024.0, 768.0);
        let mut state = MapState::default();

        assert_eq!(state.effective_mode(&boxes), EffectiveMode::Host);
        assert_eq!(state.resize(ResizeOrigin::Host, &boxes), Redraw::Resize);
        assert_eq!(*boxes.surface_inline.borrow(), None);
    }

    #[test]
    fn decoded_image_sizes_canvas_when_unsized_host() {
        let boxes = FakeBoxes::new(("auto", "auto"), (300.0, 150.0));
        let mut state = MapState::default();
        assert!(state.image_ready((1024.0, 768.0), &boxes));
        assert_eq!(*boxes.host_inline.borrow(), (Some(1024.0), Some(768.0)));
    }

    #[test]
    fn filter_sees_categories_of_new_data() {
        let mut filter = HiddenCategories::default();
        filter.hide("tower");
        let mut state = MapState::with_filter(Box::new(filter));
        state.accept_data(sample("a.png"));

        let data = state.map_data().expect("data loaded");
        assert!(visible_waypoints(data, state.filter()).is_empty());
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut state = MapState::default();
        let first = state.begin_load();
        let second = state.begin_load();

        assert!(matches!(
            state.finish_load(first, true, Ok(sample("old.png"))),
            LoadCompletion::Superseded
        ));
        assert!(state.map_data().is_none());

        assert!(matches!(
            state.finish_load(second, true, Ok(sample("new.png"))),
            LoadCompletion::Applied(Redraw::Draw)
        ));
        assert_eq!(state.map_info().map(|i| i.image.as_str()), Some("new.png"));
    }

    #[test]
    fn stale_load_does_not_overwrite_newer_data() {
        let mut state = MapState::default();
        let first = state.begin_load();
        let second = state.begin_load();
        state.finish_load(second, true, Ok(sample("new.png")));

        assert!(matches!(
            state.finish_load(first, true, Ok(sample("old.png"))),
            LoadCompletion::Superseded
        ));
        assert_eq!(state.map_info().map(|i| i.image.as_str()), Some("new.png"));
    }

    #[test]
    fn load_finishing_while_detached_is_dropped() {
        let mut state = MapState::default();
        state.apply_attribute(ATTR_DATA_SRC, None, Some("map.json"));
        let token = state.begin_load();

        assert!(matches!(
            state.finish_load(token, false, Ok(sample("a.png"))),
            LoadCompletion::Detached
        ));
        assert!(state.map_data().is_none());
    }

    #[test]
    fn load_before_attach_is_requested_again_on_attach() {
        let mut state = MapState::default();
        state.apply_attribute(ATTR_DATA_SRC, None, Some("map.json"));
        let token = state.begin_load();
        state.finish_load(token, false, Ok(sample("a.png")));

        assert_eq!(state.take_reload_source().as_deref(), Some("map.json"));
        assert_eq!(state.take_reload_source(), None);

        let token = state.begin_load();
        assert!(matches!(
            state.finish_load(token, true, Ok(sample("a.png"))),
            LoadCompletion::Applied(Redraw::Draw)
        ));
        assert!(state.map_data().is_some());
    }

    #[test]
    fn attach_without_dropped_load_fetches_nothing() {
        let mut state = MapState::default();
        state.apply_attribute(ATTR_DATA_SRC, None, Some("map.json"));
        state.begin_load();
        assert_eq!(state.take_reload_source(), None);
    }

    #[test]
    fn failed_load_keeps_previous_data_and_is_not_retried() {
        let mut state = MapState::default();
        state.apply_attribute(ATTR_DATA_SRC, None, Some("a.json"));
        let token = state.begin_load();
        state.finish_load(token, true, Ok(sample("a.png")));

        let token = state.begin_load();
        assert!(matches!(
            state.finish_load(token, false, Err(LoadError::Status(404))),
            LoadCompletion::Failed(LoadError::Status(404))
        ));
        assert_eq!(state.map_info().map(|i| i.image.as_str()), Some("a.png"));
        assert_eq!(state.take_reload_source(), None);
    }

    #[test]
    fn redraw_merge_keeps_strongest() {
        assert_eq!(Redraw::None.merge(Redraw::Draw), Redraw::Draw);
        assert_eq!(Redraw::Resize.merge(Redraw::Draw), Redraw::Resize);
        assert_eq!(Redraw::None.merge(Redraw::None), Redraw::None);
    }
}
