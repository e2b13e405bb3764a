//! DOM listeners that feed canvas input into a view group.
//!
//! Listeners hold only a weak reference to the group and are removed from
//! the canvas when dropped, so replacing or dropping a surface never leaves
//! stale handlers behind.

use std::cell::RefCell;
use std::rc::Weak;

use syncview_core::{Point, SurfaceInput, Touches};
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent,
    TouchList, WheelEvent,
};

use crate::group::GroupState;

const INPUT_EVENTS: [&str; 8] = [
    "mousedown",
    "mousemove",
    "mouseup",
    "mouseleave",
    "touchstart",
    "touchmove",
    "touchend",
    "wheel",
];

pub struct SurfaceListeners {
    target: EventTarget,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl SurfaceListeners {
    pub(crate) fn attach(
        canvas: &HtmlCanvasElement,
        name: &str,
        state: Weak<RefCell<GroupState>>,
    ) -> Result<Self, JsValue> {
        let mut attached = Self {
            target: canvas.clone().into(),
            listeners: Vec::with_capacity(INPUT_EVENTS.len()),
        };

        for event_type in INPUT_EVENTS {
            let name = name.to_string();
            let state = state.clone();
            let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                if let Some(input) = read_input(event_type, &event) {
                    route(&state, &name, input);
                }
            });

            if event_type == "wheel" {
                // Non-passive so the page does not scroll while zooming.
                let options = AddEventListenerOptions::new();
                options.set_passive(false);
                attached
                    .target
                    .add_event_listener_with_callback_and_add_event_listener_options(
                        event_type,
                        listener.as_ref().unchecked_ref(),
                        &options,
                    )?;
            } else {
                attached.target.add_event_listener_with_callback(
                    event_type,
                    listener.as_ref().unchecked_ref(),
                )?;
            }
            attached.listeners.push((event_type, listener));
        }

        Ok(attached)
    }
}

impl Drop for SurfaceListeners {
    fn drop(&mut self) {
        for (event_type, listener) in &self.listeners {
            let _ = self
                .target
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref());
        }
    }
}

/// Apply `input` to the group, then notify the surface's subscribers once
/// the group is no longer borrowed, so they may call back into it.
fn route(state: &Weak<RefCell<GroupState>>, name: &str, input: SurfaceInput) {
    let Some(state) = state.upgrade() else {
        return;
    };

    let handled = {
        let Ok(mut guard) = state.try_borrow_mut() else {
            log::warn!("Dropped input on '{}': group is busy", name);
            return;
        };
        let before = guard.view.transform().magnification;
        let result = guard.view.handle_input(name, &input);
        if guard.view.transform().magnification != before {
            guard.refresh_zoom_label();
        }
        let handlers = guard.view.gesture_handlers(name);
        result.map(|events| (events, handlers))
    };

    match handled {
        Ok((events, Some(handlers))) => {
            for event in &events {
                handlers.dispatch(event);
            }
        }
        Ok((_, None)) => {}
        Err(e) => log::warn!("Failed to handle input on '{}': {}", name, e),
    }
}

fn read_input(event_type: &str, event: &Event) -> Option<SurfaceInput> {
    match event_type {
        "mousedown" => mouse_point(event).map(SurfaceInput::MouseDown),
        "mousemove" => mouse_point(event).map(SurfaceInput::MouseMove),
        "mouseup" => mouse_point(event).map(SurfaceInput::MouseUp),
        "mouseleave" => mouse_point(event).map(SurfaceInput::MouseLeave),
        "touchstart" => touches(event).map(SurfaceInput::TouchStart),
        "touchmove" => touches(event).map(SurfaceInput::TouchMove),
        "touchend" => touches(event).map(SurfaceInput::TouchEnd),
        "wheel" => {
            let wheel = event.dyn_ref::<WheelEvent>()?;
            wheel.prevent_default();
            Some(SurfaceInput::Wheel {
                point: Point::new(wheel.client_x() as f64, wheel.client_y() as f64),
                delta_y: wheel.delta_y(),
            })
        }
        _ => None,
    }
}

fn mouse_point(event: &Event) -> Option<Point> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(Point::new(mouse.client_x() as f64, mouse.client_y() as f64))
}

fn touches(event: &Event) -> Option<Touches> {
    let touch = event.dyn_ref::<TouchEvent>()?;
    Some(Touches::new(
        touch_points(&touch.touches()),
        touch_points(&touch.changed_touches()),
    ))
}

fn touch_points(list: &TouchList) -> Vec<Point> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|touch| Point::new(touch.client_x() as f64, touch.client_y() as f64))
        .collect()
}
