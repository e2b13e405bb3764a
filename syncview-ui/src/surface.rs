//! `RenderSurface` backed by a 2D canvas.

use syncview_core::{Bitmap, Rect, RenderSurface, ViewError};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::canvas_utils::{describe_js_error, get_2d_context};

/// A fully decoded `<img>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasImage {
    element: HtmlImageElement,
}

impl CanvasImage {
    pub fn new(element: HtmlImageElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlImageElement {
        &self.element
    }
}

impl Bitmap for CanvasImage {
    fn width(&self) -> u32 {
        self.element.natural_width()
    }

    fn height(&self) -> u32 {
        self.element.natural_height()
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = get_2d_context(&canvas)?;
        Ok(Self { canvas, context })
    }
}

fn surface_error(err: JsValue) -> ViewError {
    ViewError::Surface(describe_js_error(&err))
}

impl RenderSurface for CanvasSurface {
    type Image = CanvasImage;

    fn bounds(&self) -> Rect {
        let rect = self.canvas.get_bounding_client_rect();
        Rect::new(
            rect.left(),
            rect.top(),
            self.canvas.client_width() as f64,
            self.canvas.client_height() as f64,
        )
    }

    fn reset(&mut self, width: u32, height: u32) -> Result<(), ViewError> {
        // Assigning the size resets the context, so only do it on change.
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        self.context.clear_rect(0.0, 0.0, width as f64, height as f64);
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &CanvasImage,
        source: &Rect,
        target: &Rect,
    ) -> Result<(), ViewError> {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image.element(),
                source.x,
                source.y,
                source.width,
                source.height,
                target.x,
                target.y,
                target.width,
                target.height,
            )
            .map_err(surface_error)
    }

    fn draw_divider(&mut self, x: f64, height: f64) -> Result<(), ViewError> {
        self.context.begin_path();
        self.context.move_to(x, 0.0);
        self.context.line_to(x, height);
        self.context.stroke();
        Ok(())
    }
}
