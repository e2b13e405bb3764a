use crate::geometry::Rect;
use crate::payload::Bitmap;
use crate::ViewError;

/// A drawable square target registered with a view group.
///
/// Implementations wrap a concrete backend (a browser canvas, a recording
/// double in tests). Coordinates passed to the drawing methods are in backing
/// buffer pixels; `bounds` reports where the surface sits on screen.
pub trait RenderSurface {
    type Image: Bitmap;

    /// Current on-screen box in client coordinates. Width and height are the
    /// displayed size, which may differ from the backing buffer.
    fn bounds(&self) -> Rect;

    /// Resize the backing buffer to `width` x `height`, clearing it.
    fn reset(&mut self, width: u32, height: u32) -> Result<(), ViewError>;

    /// Draw the `source` region of `image` scaled into `target`.
    fn draw_image(&mut self, image: &Self::Image, source: &Rect, target: &Rect)
        -> Result<(), ViewError>;

    /// Stroke a vertical 1px line at `x` spanning `height`.
    fn draw_divider(&mut self, x: f64, height: f64) -> Result<(), ViewError>;
}
