//! Pointer and touch normalization for a single surface.
//!
//! A [`GestureSource`] turns raw mouse and touch input into drag and pinch
//! events. It knows nothing about images or magnification; positions are
//! reported in surface-local pixels using the bounding box supplied with
//! each input, so layout changes between events are picked up.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::ViewError;

/// Raw input delivered by the host for one surface, in client coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceInput {
    MouseDown(Point),
    MouseMove(Point),
    MouseUp(Point),
    MouseLeave(Point),
    TouchStart(Touches),
    TouchMove(Touches),
    TouchEnd(Touches),
    Wheel { point: Point, delta_y: f64 },
}

/// Touch points of a touch event: all points still on the surface, and the
/// points that changed in this event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Touches {
    pub active: Vec<Point>,
    pub changed: Vec<Point>,
}

impl Touches {
    pub fn new(active: Vec<Point>, changed: Vec<Point>) -> Self {
        Self { active, changed }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    DragStart,
    DragMove,
    DragEnd,
    Pinch,
}

impl FromStr for GestureKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drag-start" | "dragstart" => Ok(GestureKind::DragStart),
            "drag-move" | "dragmove" => Ok(GestureKind::DragMove),
            "drag-end" | "dragend" => Ok(GestureKind::DragEnd),
            "pinch" => Ok(GestureKind::Pinch),
            other => Err(ViewError::UnknownGestureKind(other.to_string())),
        }
    }
}

/// Semantic gesture emitted by a [`GestureSource`]. Positions are surface-local.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GestureEvent {
    DragStart {
        x: f64,
        y: f64,
    },
    /// `(x, y)` is the new pointer position, `(dx, dy)` the step from the previous one.
    DragMove {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
    DragEnd {
        x: f64,
        y: f64,
    },
    /// Frame-to-frame pinch update.
    Pinch {
        /// Ratio of the new span to the previous span
        d_distance: f64,
        center_x: f64,
        center_y: f64,
        /// Displacement of the pinch center since the previous reading
        dx: f64,
        dy: f64,
    },
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::DragStart { .. } => GestureKind::DragStart,
            GestureEvent::DragMove { .. } => GestureKind::DragMove,
            GestureEvent::DragEnd { .. } => GestureKind::DragEnd,
            GestureEvent::Pinch { .. } => GestureKind::Pinch,
        }
    }
}

/// Distance between the two touch points of a pinch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanMetric {
    /// `hypot(a.x - b.x, b.y - b.y)`: only the horizontal separation counts.
    #[default]
    Reference,
    /// True point-to-point distance.
    Euclidean,
}

impl SpanMetric {
    #[allow(clippy::eq_op)]
    pub fn span(&self, a: &Point, b: &Point) -> f64 {
        match self {
            SpanMetric::Reference => (a.x - b.x).hypot(b.y - b.y),
            SpanMetric::Euclidean => (a.x - b.x).hypot(a.y - b.y),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    pub active: bool,
    pub last_x: f64,
    pub last_y: f64,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinchState {
    pub active: bool,
    pub center_x: f64,
    pub center_y: f64,
    pub mean_span: f64,
}

pub type GestureCallback = Rc<dyn Fn(&GestureEvent)>;

/// Ordered subscriber lists, one per gesture kind.
#[derive(Default)]
pub struct GestureHandlers {
    handlers: RefCell<HashMap<GestureKind, Vec<GestureCallback>>>,
}

impl GestureHandlers {
    pub fn on(&self, kind: GestureKind, callback: impl Fn(&GestureEvent) + 'static) {
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Rc::new(callback));
    }

    /// Subscribe by kind name. Unknown names are a programming error and are
    /// reported instead of being silently dropped.
    pub fn on_named(
        &self,
        kind: &str,
        callback: impl Fn(&GestureEvent) + 'static,
    ) -> Result<(), ViewError> {
        let kind = kind.parse::<GestureKind>()?;
        self.on(kind, callback);
        Ok(())
    }

    pub fn count(&self, kind: GestureKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke the subscribers of the event's kind in registration order.
    pub fn dispatch(&self, event: &GestureEvent) {
        // Snapshot so a subscriber may register further handlers while we iterate.
        let subscribers = self
            .handlers
            .borrow()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for callback in subscribers {
            callback(event);
        }
    }
}

pub struct GestureSource {
    drag: DragState,
    pinch: PinchState,
    span_metric: SpanMetric,
    handlers: Rc<GestureHandlers>,
}

impl GestureSource {
    pub fn new(span_metric: SpanMetric) -> Self {
        Self {
            drag: DragState::default(),
            pinch: PinchState::default(),
            span_metric,
            handlers: Rc::new(GestureHandlers::default()),
        }
    }

    pub fn handlers(&self) -> Rc<GestureHandlers> {
        Rc::clone(&self.handlers)
    }

    pub fn on(&self, kind: GestureKind, callback: impl Fn(&GestureEvent) + 'static) {
        self.handlers.on(kind, callback);
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn pinch_state(&self) -> &PinchState {
        &self.pinch
    }

    /// Translate `input` and notify subscribers of every resulting event.
    pub fn feed(&mut self, input: &SurfaceInput, bounds: &Rect) -> Vec<GestureEvent> {
        let events = self.translate(input, bounds);
        for event in &events {
            self.handlers.dispatch(event);
        }
        events
    }

    /// Translate `input` into gesture events without notifying subscribers.
    pub fn translate(&mut self, input: &SurfaceInput, bounds: &Rect) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        match input {
            SurfaceInput::MouseDown(point) => events.push(self.begin_drag(point, bounds)),
            SurfaceInput::MouseMove(point) => events.extend(self.move_drag(point, bounds)),
            SurfaceInput::MouseUp(_) | SurfaceInput::MouseLeave(_) => {
                events.push(self.end_drag());
            }
            SurfaceInput::TouchStart(touches) => {
                if touches.active.len() == 1 {
                    let point = touches.changed.first().unwrap_or(&touches.active[0]);
                    events.push(self.begin_drag(point, bounds));
                } else if let [a, b, ..] = touches.active.as_slice() {
                    // Cancel without a drag-end: the pinch takes over.
                    self.drag = DragState::default();
                    self.pinch = self.read_pinch(a, b, bounds);
                }
            }
            SurfaceInput::TouchMove(touches) => match touches.active.as_slice() {
                [a, b, ..] if self.pinch.active => {
                    let reading = self.read_pinch(a, b, bounds);
                    events.push(GestureEvent::Pinch {
                        d_distance: reading.mean_span / self.pinch.mean_span,
                        center_x: reading.center_x,
                        center_y: reading.center_y,
                        dx: reading.center_x - self.pinch.center_x,
                        dy: reading.center_y - self.pinch.center_y,
                    });
                    self.pinch = reading;
                }
                _ => {
                    if let Some(point) = touches.changed.first() {
                        events.extend(self.move_drag(point, bounds));
                    }
                }
            },
            SurfaceInput::TouchEnd(touches) => match touches.active.as_slice() {
                [] => {
                    self.pinch = PinchState::default();
                    events.push(self.end_drag());
                }
                [remaining] if self.pinch.active => {
                    // Resume dragging with the finger that stayed down.
                    self.pinch = PinchState::default();
                    events.push(self.begin_drag(remaining, bounds));
                }
                _ => {}
            },
            SurfaceInput::Wheel { .. } => {}
        }
        events
    }

    fn begin_drag(&mut self, point: &Point, bounds: &Rect) -> GestureEvent {
        let local = point.relative_to(bounds);
        self.drag = DragState {
            active: true,
            last_x: local.x,
            last_y: local.y,
            dx: 0.0,
            dy: 0.0,
        };
        GestureEvent::DragStart {
            x: local.x,
            y: local.y,
        }
    }

    fn move_drag(&mut self, point: &Point, bounds: &Rect) -> Option<GestureEvent> {
        if !self.drag.active {
            return None;
        }
        let local = point.relative_to(bounds);
        self.drag.dx = local.x - self.drag.last_x;
        self.drag.dy = local.y - self.drag.last_y;
        let event = GestureEvent::DragMove {
            x: local.x,
            y: local.y,
            dx: self.drag.dx,
            dy: self.drag.dy,
        };
        self.drag.last_x = local.x;
        self.drag.last_y = local.y;
        Some(event)
    }

    fn end_drag(&mut self) -> GestureEvent {
        let event = GestureEvent::DragEnd {
            x: self.drag.last_x,
            y: self.drag.last_y,
        };
        self.drag = DragState::default();
        event
    }

    fn read_pinch(&self, a: &Point, b: &Point, bounds: &Rect) -> PinchState {
        let center = a.midpoint(b).relative_to(bounds);
        PinchState {
            active: true,
            center_x: center.x,
            center_y: center.y,
            mean_span: self.span_metric.span(a, b),
        }
    }
}
