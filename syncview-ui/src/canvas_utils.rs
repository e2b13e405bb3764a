use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement, HtmlImageElement,
};

/// Get 2D rendering context from canvas.
pub fn get_2d_context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("No 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document"))
}

pub fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = document()?
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

/// Render `image` at full resolution into an offscreen canvas and encode it as a PNG data URL.
pub fn image_data_url(image: &HtmlImageElement) -> Result<String, JsValue> {
    let canvas = create_canvas(image.natural_width(), image.natural_height())?;
    get_2d_context(&canvas)?.draw_image_with_html_image_element(image, 0.0, 0.0)?;
    canvas.to_data_url()
}

/// Start a browser download of `url` saved as `file_name`.
pub fn trigger_download(url: &str, file_name: &str) -> Result<(), JsValue> {
    let link = document()?
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()?;
    link.set_href(url);
    link.set_download(file_name);
    link.click();
    Ok(())
}

/// Readable text for a thrown JS value.
pub fn describe_js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
