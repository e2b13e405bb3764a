//! Synchronized pan/zoom engine for side-by-side image comparison.
//!
//! Pure Rust and free of browser dependencies; the wasm bindings live in
//! `syncview-ui`.

pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod group;
pub mod loads;
pub mod payload;
pub mod render;
pub mod surface;
pub mod transform;

pub use config::GroupConfig;
pub use error::ViewError;
pub use geometry::{Point, Rect};
pub use gesture::{
    GestureEvent, GestureHandlers, GestureKind, GestureSource, SpanMetric, SurfaceInput, Touches,
};
pub use group::{ExportTarget, ViewGroup};
pub use loads::{LoadSequencer, LoadTicket};
pub use payload::{Bitmap, DisplayMode, ImagePayload, Version};
pub use render::{DrawCommand, RenderPlan};
pub use surface::RenderSurface;
pub use transform::{AnchorMode, ViewTransform, ZoomPolicy};
