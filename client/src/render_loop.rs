use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Work to do on one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWork {
    /// Resynchronize the backing buffer before drawing.
    pub resize: bool,
}

/// Request bookkeeping behind [`RenderScheduler`], kept free of browser types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameRequests {
    dirty: bool,
    resize_pending: bool,
    scheduled: bool,
    cancelled: bool,
}

impl FrameRequests {
    /// Record a redraw request. Returns `true` when the caller must schedule a
    /// frame; `false` when one is already pending or the scheduler is cancelled.
    pub fn request(&mut self, resize: bool) -> bool {
        if self.cancelled {
            return false;
        }
        self.dirty = true;
        self.resize_pending |= resize;
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// The frame could not be scheduled; allow the next request to try again.
    pub fn schedule_failed(&mut self) {
        self.scheduled = false;
    }

    /// Consume the pending work for the frame that is now running.
    pub fn begin_frame(&mut self) -> Option<FrameWork> {
        self.scheduled = false;
        if self.cancelled || !self.dirty {
            return None;
        }
        self.dirty = false;
        let resize = std::mem::take(&mut self.resize_pending);
        Some(FrameWork { resize })
    }

    pub fn cancel(&mut self) {
        *self = Self {
            cancelled: true,
            ..Self::default()
        };
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

/// Batches render requests via `requestAnimationFrame`.
///
/// Call `mark_dirty()` or `mark_resized()` whenever state changes. The render
/// function fires at most once per vsync, coalescing all requests made before it.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    requests: Cell<FrameRequests>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn update<T>(&self, f: impl FnOnce(&mut FrameRequests) -> T) -> T {
        let mut requests = self.requests.get();
        let out = f(&mut requests);
        self.requests.set(requests);
        out
    }

    fn request(&self, resize: bool) {
        if !self.update(|r| r.request(resize)) {
            return;
        }
        let cb_ref = self.callback.borrow();
        let Some(cb) = cb_ref.as_ref() else {
            self.update(FrameRequests::schedule_failed);
            return;
        };
        let Some(window) = self.window.as_ref() else {
            self.update(FrameRequests::schedule_failed);
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => self.update(FrameRequests::schedule_failed),
        }
    }
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn(FrameWork) + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            requests: Cell::new(FrameRequests::default()),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = inner_cb.upgrade() else {
                return;
            };
            inner.raf_id.set(None);
            if let Some(work) = inner.update(FrameRequests::begin_frame) {
                render_fn(work);
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    /// Mark the scene as needing a repaint.
    pub fn mark_dirty(&self) {
        self.inner.request(false);
    }

    /// Mark the scene as needing a repaint after resizing the backing buffer.
    pub fn mark_resized(&self) {
        self.inner.request(true);
    }

    /// Drop any pending frame; later requests are ignored.
    pub fn cancel(&self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.update(FrameRequests::cancel);
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.cancel();
        self.inner.callback.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_schedules_once() {
        let mut requests = FrameRequests::default();
        assert!(requests.request(false));
        assert!(!requests.request(false));
        assert!(!requests.request(true));
        assert!(requests.is_scheduled());
    }

    #[test]
    fn burst_collapses_into_one_frame() {
        let mut requests = FrameRequests::default();
        requests.request(false);
        requests.request(true);
        requests.request(false);

        assert_eq!(requests.begin_frame(), Some(FrameWork { resize: true }));
        assert_eq!(requests.begin_frame(), None);
    }

    #[test]
    fn resize_flag_clears_after_frame() {
        let mut requests = FrameRequests::default();
        requests.request(true);
        requests.begin_frame();

        assert!(requests.request(false));
        assert_eq!(requests.begin_frame(), Some(FrameWork { resize: false }));
    }

    #[test]
    fn failed_schedule_allows_retry() {
        let mut requests = FrameRequests::default();
        assert!(requests.request(false));
        requests.schedule_failed();
        assert!(requests.request(false));
    }

    #[test]
    fn cancelled_requests_never_draw() {
        let mut requests = FrameRequests::default();
        requests.request(true);
        requests.cancel();

        assert_eq!(requests.begin_frame(), None);
        assert!(!requests.request(false));
        assert_eq!(requests.begin_frame(), None);
    }
}
