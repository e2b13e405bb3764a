//! Asynchronous image loading.
//!
//! Images are fetched with `XMLHttpRequest` so download progress can be
//! reported, turned into an object URL, and decoded through
//! `HTMLImageElement.decode()` before they are handed to a view group.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, HtmlImageElement, ProgressEvent, Url, XmlHttpRequest, XmlHttpRequestResponseType,
};

use crate::canvas_utils::describe_js_error;
use crate::surface::CanvasImage;

/// Prefix assumed for base64 payloads passed without a data-URL header.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("image could not be decoded: {0}")]
    Decode(String),
}

impl From<LoadError> for JsValue {
    fn from(err: LoadError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Turn a bare base64 PNG payload into a data URL. Strings that already
/// carry a header (anything with a comma) are used as they are.
pub fn normalize_data_url(encoded: &str) -> String {
    if encoded.contains(',') {
        encoded.to_string()
    } else {
        format!("{PNG_DATA_URL_PREFIX}{encoded}")
    }
}

/// Download progress as a whole percentage, or None when the total is unknown.
pub fn progress_percent(loaded: f64, total: f64) -> Option<u32> {
    if !(total.is_finite() && total > 0.0 && loaded.is_finite()) {
        return None;
    }
    Some((loaded / total * 100.0).floor().clamp(0.0, 100.0) as u32)
}

/// Decode the image at `src` (a URL, object URL, or data URL).
pub async fn decode_image(src: &str) -> Result<CanvasImage, LoadError> {
    let element =
        HtmlImageElement::new().map_err(|e| LoadError::Decode(describe_js_error(&e)))?;
    element.set_src(src);
    JsFuture::from(element.decode())
        .await
        .map_err(|e| LoadError::Decode(describe_js_error(&e)))?;
    Ok(CanvasImage::new(element))
}

/// Fetch `url` and decode it, reporting progress percentages to `on_progress`.
pub async fn load_image(
    url: &str,
    on_progress: Option<js_sys::Function>,
) -> Result<CanvasImage, LoadError> {
    let blob = fetch_blob(url, on_progress).await?;
    let object_url = Url::create_object_url_with_blob(&blob)
        .map_err(|e| LoadError::Decode(describe_js_error(&e)))?;
    let decoded = decode_image(&object_url).await;
    if let Err(e) = Url::revoke_object_url(&object_url) {
        log::warn!("Failed to revoke object URL: {}", describe_js_error(&e));
    }
    decoded
}

async fn fetch_blob(url: &str, on_progress: Option<js_sys::Function>) -> Result<Blob, LoadError> {
    let network = |e: JsValue| LoadError::Network(describe_js_error(&e));

    let request = XmlHttpRequest::new().map_err(network)?;
    request.open_with_async("GET", url, true).map_err(network)?;
    request.set_response_type(XmlHttpRequestResponseType::Blob);

    let (sender, receiver) = oneshot::channel::<Result<(), LoadError>>();
    let sender = Rc::new(RefCell::new(Some(sender)));
    let settle = move |result: Result<(), LoadError>| {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(result);
        }
    };

    let on_load = {
        let settle = settle.clone();
        let request = request.clone();
        Closure::<dyn FnMut(ProgressEvent)>::new(move |_: ProgressEvent| {
            let result = match request.status() {
                Ok(status) if (200..300).contains(&status) => Ok(()),
                Ok(status) => Err(LoadError::Status(status)),
                Err(e) => Err(LoadError::Network(describe_js_error(&e))),
            };
            settle(result);
        })
    };
    let on_error = {
        let url = url.to_string();
        Closure::<dyn FnMut(ProgressEvent)>::new(move |_: ProgressEvent| {
            settle(Err(LoadError::Network(url.clone())));
        })
    };
    let progress = on_progress.map(|callback| {
        report_progress(&callback, 0);
        Closure::<dyn FnMut(ProgressEvent)>::new(move |e: ProgressEvent| {
            if !e.length_computable() {
                return;
            }
            if let Some(percent) = progress_percent(e.loaded(), e.total()) {
                report_progress(&callback, percent);
            }
        })
    });

    request.set_onload(Some(on_load.as_ref().unchecked_ref()));
    request.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    request.set_onabort(Some(on_error.as_ref().unchecked_ref()));
    if let Some(progress) = &progress {
        request.set_onprogress(Some(progress.as_ref().unchecked_ref()));
    }
    request.send().map_err(network)?;

    let outcome = receiver
        .await
        .unwrap_or_else(|_| Err(LoadError::Network(url.to_string())));

    request.set_onload(None);
    request.set_onerror(None);
    request.set_onabort(None);
    request.set_onprogress(None);
    outcome?;

    request
        .response()
        .map_err(network)?
        .dyn_into::<Blob>()
        .map_err(|_| LoadError::Decode("response is not a blob".to_string()))
}

fn report_progress(callback: &js_sys::Function, percent: u32) {
    if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(percent)) {
        log::warn!("Progress callback failed: {}", describe_js_error(&e));
    }
}
