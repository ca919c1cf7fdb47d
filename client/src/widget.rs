use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, ShadowRoot, ShadowRootInit,
    ShadowRootMode,
};

use crate::attributes::AttributeEffect;
use crate::dom::{DomLayout, SizeObservation};
use crate::extensions::{FilterController, NoWaypoints, WaypointRenderer, visible_waypoints};
use crate::geometry::CanvasGeometry;
use crate::input::InputBindings;
use crate::loader::{DataLoader, HttpDataLoader, load_stylesheet};
use crate::render_loop::{FrameWork, RenderScheduler};
use crate::renderer::{self, DecodedImage, Renderer};
use crate::size::{EffectiveMode, LayoutBoxes, ResizeOrigin};
use crate::state::{LoadCompletion, MapState, Redraw};

/// Callbacks the hosting element forwards.
pub trait WidgetLifecycle {
    fn on_attach(&self);
    fn on_detach(&self);
    fn on_attribute_change(&self, name: &str, old: Option<&str>, new: Option<&str>);
}

/// Diagnostic snapshot of a widget.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetState {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub size_sync: game_map_shared::SizeSyncMode,
    pub effective_mode: Option<EffectiveMode>,
    pub has_data: bool,
    pub buffer: Option<BufferSize>,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BufferSize {
    pub width: u32,
    pub height: u32,
}

/// One map widget bound to its host element.
pub struct GameMap {
    inner: Rc<Inner>,
}

struct Inner {
    host: HtmlElement,
    shadow: Option<ShadowRoot>,
    canvas: RefCell<Option<HtmlCanvasElement>>,
    state: RefCell<MapState>,
    renderer: Rc<Renderer>,
    loader: Box<dyn DataLoader>,
    waypoints: RefCell<Box<dyn WaypointRenderer>>,
    geometry: Cell<Option<CanvasGeometry>>,
    attached: Cell<bool>,
    session: RefCell<Option<Session>>,
}

/// Resources that only exist while attached. Dropping them cancels the pending
/// frame, disconnects size observation and removes input listeners.
struct Session {
    layout: DomLayout,
    ctx: Option<CanvasRenderingContext2d>,
    scheduler: RenderScheduler,
    _observation: Option<SizeObservation>,
    _input: Option<InputBindings>,
}

impl GameMap {
    pub fn new(host: HtmlElement) -> Self {
        Self::with_loader(host, Box::new(HttpDataLoader))
    }

    pub fn with_loader(host: HtmlElement, loader: Box<dyn DataLoader>) -> Self {
        let init = ShadowRootInit::new(ShadowRootMode::Open);
        let shadow = host.attach_shadow(&init).ok();
        let inner = Rc::new(Inner {
            host,
            shadow,
            canvas: RefCell::new(None),
            state: RefCell::new(MapState::default()),
            renderer: Renderer::new(),
            loader,
            waypoints: RefCell::new(Box::new(NoWaypoints)),
            geometry: Cell::new(None),
            attached: Cell::new(false),
            session: RefCell::new(None),
        });
        adopt_shared_stylesheet(Rc::downgrade(&inner));
        Self { inner }
    }

    pub fn set_waypoint_renderer(&self, renderer: Box<dyn WaypointRenderer>) {
        *self.inner.waypoints.borrow_mut() = renderer;
        self.inner.request(Redraw::Draw);
    }

    pub fn set_filter(&self, filter: Box<dyn FilterController>) {
        self.inner.state.borrow_mut().set_filter(filter);
        self.inner.request(Redraw::Draw);
    }

    pub fn zoom(&self, factor: f64) {
        Inner::zoom(&self.inner, factor);
    }

    pub fn state(&self) -> WidgetState {
        let state = self.inner.state.borrow();
        let effective_mode = self
            .inner
            .session
            .borrow()
            .as_ref()
            .map(|session| state.effective_mode(&session.layout));
        WidgetState {
            zoom: state.viewport.zoom,
            pan_x: state.viewport.pan_x,
            pan_y: state.viewport.pan_y,
            size_sync: state.size_sync(),
            effective_mode,
            has_data: state.map_data().is_some(),
            buffer: self.inner.geometry.get().map(|g| BufferSize {
                width: g.buffer_width,
                height: g.buffer_height,
            }),
        }
    }
}

impl WidgetLifecycle for GameMap {
    fn on_attach(&self) {
        if self.inner.attached.replace(true) {
            return;
        }
        let Some(canvas) = Inner::ensure_canvas(&self.inner) else {
            web_sys::console::warn_1(&"game-map: could not create its canvas".into());
            return;
        };
        let layout = DomLayout {
            host: self.inner.host.clone(),
            canvas: canvas.clone(),
        };
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());

        let weak = Rc::downgrade(&self.inner);
        let scheduler = RenderScheduler::new({
            let weak = weak.clone();
            move |work| {
                if let Some(inner) = weak.upgrade() {
                    Inner::run_frame(&inner, work);
                }
            }
        });
        let input = InputBindings::attach(&canvas, {
            let weak = weak.clone();
            move |factor| {
                if let Some(inner) = weak.upgrade() {
                    Inner::zoom(&inner, factor);
                }
            }
        })
        .ok();
        let observation = SizeObservation::start(&layout, move |origin| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_resize(origin);
            }
        })
        .ok();

        *self.inner.session.borrow_mut() = Some(Session {
            layout,
            ctx,
            scheduler,
            _observation: observation,
            _input: input,
        });

        self.inner.resync();
        self.inner.request(Redraw::Resize);

        let reload = self.inner.state.borrow_mut().take_reload_source();
        if let Some(src) = reload {
            Inner::load_data(&self.inner, &src);
        }
    }

    fn on_detach(&self) {
        self.inner.attached.set(false);
        let session = self.inner.session.borrow_mut().take();
        drop(session);
    }

    fn on_attribute_change(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        let effect = self.inner.state.borrow_mut().apply_attribute(name, old, new);
        match effect {
            AttributeEffect::LoadData(src) => Inner::load_data(&self.inner, &src),
            AttributeEffect::ResyncSize(_) => self.inner.resync(),
            AttributeEffect::None => {}
        }
    }
}

impl Inner {
    fn ensure_canvas(this: &Rc<Self>) -> Option<HtmlCanvasElement> {
        if let Some(canvas) = this.canvas.borrow().as_ref() {
            return Some(canvas.clone());
        }
        let document = web_sys::window()?.document()?;
        let canvas = document
            .create_element("canvas")
            .ok()?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let appended = match this.shadow.as_ref() {
            Some(shadow) => shadow.append_child(&canvas),
            None => this.host.append_child(&canvas),
        };
        appended.ok()?;
        *this.canvas.borrow_mut() = Some(canvas.clone());
        Some(canvas)
    }

    fn request(&self, redraw: Redraw) {
        let session = self.session.borrow();
        let Some(session) = session.as_ref() else {
            return;
        };
        match redraw {
            Redraw::None => {}
            Redraw::Draw => session.scheduler.mark_dirty(),
            Redraw::Resize => session.scheduler.mark_resized(),
        }
    }

    fn zoom(this: &Rc<Self>, factor: f64) {
        let redraw = this.state.borrow_mut().zoom(factor);
        this.request(redraw);
    }

    fn handle_resize(&self, origin: ResizeOrigin) {
        let redraw = {
            let session = self.session.borrow();
            let Some(session) = session.as_ref() else {
                return;
            };
            self.state.borrow_mut().resize(origin, &session.layout)
        };
        self.request(redraw);
    }

    fn resync(&self) {
        let redraw = {
            let session = self.session.borrow();
            let Some(session) = session.as_ref() else {
                return;
            };
            self.state.borrow_mut().resync(&session.layout)
        };
        self.request(redraw);
    }

    fn load_data(this: &Rc<Self>, src: &str) {
        let token = this.state.borrow_mut().begin_load();
        let pending = this.loader.load(src);
        let weak = Rc::downgrade(this);
        let src = src.to_owned();
        wasm_bindgen_futures::spawn_local(async move {
            let result = pending.await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let completion = inner
                .state
                .borrow_mut()
                .finish_load(token, inner.attached.get(), result);
            match completion {
                LoadCompletion::Applied(redraw) => inner.request(redraw),
                LoadCompletion::Failed(err) => {
                    web_sys::console::warn_1(&format!("Failed to load data from {src}: {err}").into());
                }
                LoadCompletion::Superseded | LoadCompletion::Detached => {}
            }
        });
    }

    fn run_frame(this: &Rc<Self>, work: FrameWork) {
        if !this.attached.get() {
            return;
        }
        {
            let session = this.session.borrow();
            let Some(session) = session.as_ref() else {
                return;
            };
            if session.ctx.is_none() {
                return;
            }
            if work.resize {
                this.geometry.set(Some(session.layout.sync_backing_buffer()));
            }
        }

        let Some(info) = this.state.borrow().map_info().cloned() else {
            return;
        };
        let weak = Rc::downgrade(this);
        this.renderer.draw_background(&info, move |decoded| {
            if let Some(inner) = weak.upgrade() {
                inner.paint(&decoded);
            }
        });
    }

    fn paint(&self, decoded: &DecodedImage) {
        if !self.attached.get() {
            return;
        }
        let session = self.session.borrow();
        let Some(session) = session.as_ref() else {
            return;
        };
        let Some(ctx) = session.ctx.as_ref() else {
            return;
        };

        let waypoints = self.waypoints.borrow();
        let geometry = renderer::present(
            &mut self.state.borrow_mut(),
            &session.layout,
            decoded.natural_size(),
            ctx,
            &decoded.image,
            |ctx, state| {
                let visible = state
                    .map_data()
                    .map(|data| visible_waypoints(data, state.filter()))
                    .unwrap_or_default();
                waypoints.render_waypoints(ctx, &visible, &state.viewport);
            },
        );
        self.geometry.set(Some(geometry));
    }
}

fn adopt_shared_stylesheet(weak: Weak<Inner>) {
    wasm_bindgen_futures::spawn_local(async move {
        match load_stylesheet().await {
            Ok(sheet) => {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let Some(shadow) = inner.shadow.as_ref() else {
                    return;
                };
                let sheets = js_sys::Array::of1(&sheet);
                let _ = Reflect::set(
                    shadow.as_ref(),
                    &JsValue::from_str("adoptedStyleSheets"),
                    &sheets,
                );
            }
            Err(err) => {
                web_sys::console::warn_1(&format!("game-map stylesheet: {err}").into());
            }
        }
    });
}
