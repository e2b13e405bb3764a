//! Browser bindings for the synchronized image comparison viewer.
//!
//! Page scripts create a [`SyncViewGroup`], register canvases, and hand it
//! images; panning and zooming any canvas moves every canvas of the group.

use wasm_bindgen::prelude::*;

pub mod canvas_utils;
pub mod group;
pub mod listeners;
pub mod loader;
pub mod surface;

pub use group::SyncViewGroup;
pub use loader::LoadError;
pub use surface::{CanvasImage, CanvasSurface};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);
}
