//! Wheel-zoom and drag-pan on the root `<svg>`, applied to the content
//! group's `transform` attribute.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use foundation::math::Vec2;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use persistence::TransformSnapshot;
use runtime::ZoomSurface;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent, SvgGraphicsElement, TouchEvent, WheelEvent};

/// Pointer travel (px) after which a press counts as a drag, not a click.
const CLICK_TOLERANCE_PX: f64 = 3.0;

/// Scale step for a double click on the background; shift zooms out.
const DOUBLE_CLICK_FACTOR: f64 = 2.0;

/// Scale factor for one wheel event. Line and page deltas are scaled up so
/// a notch zooms roughly the same amount in every delta mode.
pub fn wheel_factor(delta_y: f64, delta_mode: u32) -> f64 {
    let per_unit = match delta_mode {
        0 => 0.002,
        1 => 0.05,
        _ => 1.0,
    };
    2f64.powf(-delta_y * per_unit)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomState {
    transform: TransformSnapshot,
    extent: [f64; 2],
}

impl ZoomState {
    pub fn new(extent: [f64; 2]) -> Self {
        Self {
            transform: TransformSnapshot::IDENTITY,
            extent,
        }
    }

    pub fn transform(&self) -> TransformSnapshot {
        self.transform
    }

    /// Replaces the transform as-is; programmatic moves are not clamped.
    /// A degenerate transform is ignored so later gestures stay finite.
    pub fn set(&mut self, transform: TransformSnapshot) {
        if transform.validate().is_ok() {
            self.transform = transform;
        }
    }

    /// Scales by `factor` about `pivot` (viewport coordinates), keeping the
    /// content point under the pivot fixed. Returns `None` when the clamped
    /// scale does not change.
    pub fn zoom_at(&mut self, pivot: Vec2, factor: f64) -> Option<TransformSnapshot> {
        let t = self.transform;
        let [min, max] = self.extent;
        let k = (t.k * factor).clamp(min, max);
        if !k.is_finite() || k == t.k {
            return None;
        }
        let content_x = (pivot.x - t.x) / t.k;
        let content_y = (pivot.y - t.y) / t.k;
        self.transform = TransformSnapshot::new(pivot.x - content_x * k, pivot.y - content_y * k, k);
        Some(self.transform)
    }

    pub fn pan(&mut self, delta: Vec2) -> Option<TransformSnapshot> {
        if delta == Vec2::ZERO || !delta.is_finite() {
            return None;
        }
        let t = self.transform;
        self.transform = TransformSnapshot::new(t.x + delta.x, t.y + delta.y, t.k);
        Some(self.transform)
    }

    /// Two-finger gesture: the midpoint drags the view and the change in
    /// finger spread scales it about the new midpoint.
    pub fn pinch(&mut self, from: [Vec2; 2], to: [Vec2; 2]) -> Option<TransformSnapshot> {
        let before = from[0].distance(from[1]);
        let after = to[0].distance(to[1]);
        if !(before > 0.0 && after.is_finite()) {
            return None;
        }
        let start = self.transform;
        let (mid_from, mid_to) = (midpoint(from), midpoint(to));
        self.pan(mid_to - mid_from);
        self.zoom_at(mid_to, after / before);
        (self.transform != start).then_some(self.transform)
    }
}

fn midpoint([a, b]: [Vec2; 2]) -> Vec2 {
    Vec2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Active touch points in SVG user space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TouchGesture {
    Pan(Vec2),
    Pinch(Vec2, Vec2),
}

impl TouchGesture {
    /// One finger pans, two pinch; further fingers are ignored.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        match points {
            [] => None,
            [p] => Some(TouchGesture::Pan(*p)),
            [a, b, ..] => Some(TouchGesture::Pinch(*a, *b)),
        }
    }

    /// Applies the move from `self` to `next`. A change in finger count only
    /// re-anchors the gesture.
    pub fn step(self, next: Self, state: &mut ZoomState) -> Option<TransformSnapshot> {
        match (self, next) {
            (TouchGesture::Pan(a), TouchGesture::Pan(b)) => state.pan(b - a),
            (TouchGesture::Pinch(a0, a1), TouchGesture::Pinch(b0, b1)) => {
                state.pinch([a0, a1], [b0, b1])
            }
            _ => None,
        }
    }
}

/// Pan/zoom behavior bound to one imported diagram.
///
/// Clones share state: the controller holds one for programmatic moves and
/// the input listeners hold another.
#[derive(Debug, Clone)]
pub struct WebZoom {
    svg: Element,
    content: Element,
    state: Rc<RefCell<ZoomState>>,
    drag: Rc<Cell<Option<DragState>>>,
    touch: Rc<Cell<Option<TouchGesture>>>,
    suppress_click: Rc<Cell<bool>>,
}

#[derive(Debug, Copy, Clone)]
struct DragState {
    start: Vec2,
    last: Vec2,
    moved: bool,
}

impl WebZoom {
    pub fn new(svg: Element, content: Element, extent: [f64; 2]) -> Self {
        Self {
            svg,
            content,
            state: Rc::new(RefCell::new(ZoomState::new(extent))),
            drag: Rc::default(),
            touch: Rc::default(),
            suppress_click: Rc::default(),
        }
    }

    /// True once for the click that ends a drag; unit handlers ignore it.
    pub fn take_suppressed_click(&self) -> bool {
        self.suppress_click.replace(false)
    }

    fn render(&self, transform: TransformSnapshot) {
        let _ = self.content.set_attribute("transform", &transform.to_svg());
    }

    fn pointer(&self, event: &MouseEvent) -> Vec2 {
        self.to_local(Vec2::new(
            f64::from(event.client_x()),
            f64::from(event.client_y()),
        ))
    }

    fn touch_gesture(&self, event: &TouchEvent) -> Option<TouchGesture> {
        let list = event.touches();
        let points: Vec<Vec2> = (0..list.length().min(2))
            .filter_map(|i| list.item(i))
            .map(|t| self.to_local(Vec2::new(f64::from(t.client_x()), f64::from(t.client_y()))))
            .collect();
        TouchGesture::from_points(&points)
    }

    fn apply_user(&self, next: Option<TransformSnapshot>, user: &dyn Fn(TransformSnapshot)) {
        if let Some(t) = next {
            self.render(t);
            user(t);
        }
    }

    /// Client coordinates to the root SVG's user space.
    fn to_local(&self, client: Vec2) -> Vec2 {
        let ctm = self
            .svg
            .dyn_ref::<SvgGraphicsElement>()
            .and_then(SvgGraphicsElement::get_screen_ctm)
            .and_then(|m| m.inverse().ok());
        match ctm {
            Some(m) => Vec2::new(
                f64::from(m.a()) * client.x + f64::from(m.c()) * client.y + f64::from(m.e()),
                f64::from(m.b()) * client.x + f64::from(m.d()) * client.y + f64::from(m.f()),
            ),
            None => {
                let rect = self.svg.get_bounding_client_rect();
                Vec2::new(client.x - rect.left(), client.y - rect.top())
            }
        }
    }

    /// Attaches wheel, double-click, mouse-drag and touch listeners.
    /// `on_user` receives every transform produced by a gesture.
    pub fn bind(&self, on_user: impl Fn(TransformSnapshot) + 'static) -> Vec<EventListener> {
        let on_user = Rc::new(on_user);
        let window = match web_sys::window() {
            Some(w) => w,
            None => return Vec::new(),
        };

        let zoom = self.clone();
        let user = on_user.clone();
        let wheel = EventListener::new_with_options(
            &self.svg,
            "wheel",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                event.prevent_default();
                let pivot = zoom.pointer(event);
                let factor = wheel_factor(event.delta_y(), event.delta_mode());
                let next = zoom.state.borrow_mut().zoom_at(pivot, factor);
                zoom.apply_user(next, &*user);
            },
        );

        // Units stop propagation of their own double clicks.
        let zoom = self.clone();
        let user = on_user.clone();
        let dblclick = EventListener::new(&self.svg, "dblclick", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let factor = if event.shift_key() {
                1.0 / DOUBLE_CLICK_FACTOR
            } else {
                DOUBLE_CLICK_FACTOR
            };
            let pivot = zoom.pointer(event);
            let next = zoom.state.borrow_mut().zoom_at(pivot, factor);
            zoom.apply_user(next, &*user);
        });

        let zoom = self.clone();
        let down = EventListener::new(&self.svg, "mousedown", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            if event.button() != 0 {
                return;
            }
            let p = zoom.pointer(event);
            zoom.drag.set(Some(DragState {
                start: p,
                last: p,
                moved: false,
            }));
        });

        let zoom = self.clone();
        let user = on_user.clone();
        let motion = EventListener::new(&window, "mousemove", move |event| {
            let (Some(event), Some(mut drag)) = (event.dyn_ref::<MouseEvent>(), zoom.drag.get())
            else {
                return;
            };
            let p = zoom.pointer(event);
            if !drag.moved && p.distance(drag.start) <= CLICK_TOLERANCE_PX {
                return;
            }
            drag.moved = true;
            let delta = p - drag.last;
            drag.last = p;
            zoom.drag.set(Some(drag));
            let next = zoom.state.borrow_mut().pan(delta);
            zoom.apply_user(next, &*user);
        });

        let zoom = self.clone();
        let up = EventListener::new(&window, "mouseup", move |_| {
            let Some(drag) = zoom.drag.take() else {
                return;
            };
            if drag.moved {
                // The click that follows this mouseup is dispatched before
                // any timer runs.
                zoom.suppress_click.set(true);
                let flag = zoom.suppress_click.clone();
                let _ = Timeout::new(0, move || flag.set(false)).forget();
            }
        });

        let zoom = self.clone();
        let touch_start = EventListener::new(&self.svg, "touchstart", move |event| {
            if let Some(event) = event.dyn_ref::<TouchEvent>() {
                zoom.touch.set(zoom.touch_gesture(event));
            }
        });

        let zoom = self.clone();
        let user = on_user.clone();
        let touch_move = EventListener::new_with_options(
            &self.svg,
            "touchmove",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let (Some(prev), Some(next)) = (zoom.touch.get(), zoom.touch_gesture(event))
                else {
                    return;
                };
                event.prevent_default();
                zoom.touch.set(Some(next));
                let moved = prev.step(next, &mut zoom.state.borrow_mut());
                zoom.apply_user(moved, &*user);
            },
        );

        let mut listeners = vec![wheel, dblclick, down, motion, up, touch_start, touch_move];
        for name in ["touchend", "touchcancel"] {
            let zoom = self.clone();
            listeners.push(EventListener::new(&self.svg, name, move |event| {
                if let Some(event) = event.dyn_ref::<TouchEvent>() {
                    // Remaining fingers re-anchor the gesture.
                    zoom.touch.set(zoom.touch_gesture(event));
                }
            }));
        }
        listeners
    }
}

impl ZoomSurface for WebZoom {
    fn apply_transform(&self, transform: TransformSnapshot) {
        let applied = {
            let mut state = self.state.borrow_mut();
            state.set(transform);
            state.transform()
        };
        self.render(applied);
    }
}
