//! `SyncViewGroup`: the view group exposed to page scripts.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise};
use syncview_core::{DisplayMode, GroupConfig, LoadTicket, Version, ViewError, ViewGroup};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{HtmlCanvasElement, HtmlElement, HtmlImageElement};

use crate::canvas_utils::{describe_js_error, image_data_url, trigger_download};
use crate::listeners::SurfaceListeners;
use crate::loader::{self, normalize_data_url};
use crate::surface::{CanvasImage, CanvasSurface};

/// State shared between the group handle, its DOM listeners, and pending loads.
pub(crate) struct GroupState {
    pub(crate) view: ViewGroup<CanvasSurface>,
    zoom_label: Option<HtmlElement>,
}

impl GroupState {
    /// Mirror the current magnification into the label element, if any.
    pub(crate) fn refresh_zoom_label(&self) {
        if let Some(label) = &self.zoom_label {
            label.set_text_content(Some(&self.view.zoom_label()));
        }
    }
}

fn to_js(err: ViewError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn busy() -> JsValue {
    JsValue::from_str("SyncViewGroup is busy")
}

/// A set of canvases that pan and zoom together.
#[wasm_bindgen]
pub struct SyncViewGroup {
    state: Rc<RefCell<GroupState>>,
    listeners: RefCell<HashMap<String, SurfaceListeners>>,
}

#[wasm_bindgen]
impl SyncViewGroup {
    /// Create a group whose canvases are `2 * viewportSize` pixels square (default 150).
    #[wasm_bindgen(constructor)]
    pub fn new(viewport_size: Option<u32>) -> Result<SyncViewGroup, JsValue> {
        let config = viewport_size
            .map(GroupConfig::with_viewport_size)
            .unwrap_or_default();
        Self::from_config(config)
    }

    /// Create a group from a plain configuration object; missing fields take defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<SyncViewGroup, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            GroupConfig::default()
        } else {
            config
                .into_serde::<GroupConfig>()
                .map_err(|e| to_js(ViewError::InvalidConfig(e.to_string())))?
        };
        Self::from_config(config)
    }

    /// Attach `canvas` under `name`, replacing any canvas registered before.
    ///
    /// Gesture subscriptions belong to the registration; they must be made
    /// again after a canvas is replaced.
    #[wasm_bindgen(js_name = registerCanvas)]
    pub fn register_canvas(&self, name: &str, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
        let surface = CanvasSurface::new(canvas.clone())?;
        self.listeners.borrow_mut().remove(name);
        {
            let mut state = self.state()?;
            state.view.register_surface(name, surface).map_err(to_js)?;
            state.view.render(name).map_err(to_js)?;
        }
        let listeners = SurfaceListeners::attach(&canvas, name, Rc::downgrade(&self.state))?;
        self.listeners
            .borrow_mut()
            .insert(name.to_string(), listeners);
        Ok(())
    }

    /// Detach the canvas under `name`. Returns whether one was registered.
    #[wasm_bindgen(js_name = unregisterCanvas)]
    pub fn unregister_canvas(&self, name: &str) -> Result<bool, JsValue> {
        self.listeners.borrow_mut().remove(name);
        Ok(self.state()?.view.unregister_surface(name).is_some())
    }

    /// Subscribe `callback` to gestures of `kind` on the canvas under `name`.
    ///
    /// The callback receives a plain object tagged with its `kind`. Unknown
    /// kinds throw.
    pub fn on(&self, name: &str, kind: &str, callback: Function) -> Result<(), JsValue> {
        let handlers = self
            .state()?
            .view
            .gesture_handlers(name)
            .ok_or_else(|| to_js(ViewError::UnknownSurface(name.to_string())))?;
        handlers
            .on_named(kind, move |event| match JsValue::from_serde(event) {
                Ok(value) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                        log::warn!("Gesture callback failed: {}", describe_js_error(&e));
                    }
                }
                Err(e) => log::warn!("Failed to serialize gesture: {}", e),
            })
            .map_err(to_js)
    }

    /// Store an already loaded `<img>` under `name` and `version` ("a", "b" or "both").
    #[wasm_bindgen(js_name = setImage)]
    pub fn set_image(
        &self,
        name: &str,
        version: &str,
        image: HtmlImageElement,
        show: bool,
        fit: bool,
    ) -> Result<(), JsValue> {
        let version = version.parse::<Version>().map_err(to_js)?;
        let mut state = self.state()?;
        state
            .view
            .set_image(name, version, CanvasImage::new(image), show, fit)
            .map_err(to_js)?;
        if show && fit {
            state.refresh_zoom_label();
        }
        Ok(())
    }

    /// Decode a base64 PNG (or any data URL) and store it.
    ///
    /// Resolves to whether the image was applied; a later request for the
    /// same slot wins over this one.
    #[wasm_bindgen(js_name = setImageBase64)]
    pub fn set_image_base64(
        &self,
        name: &str,
        version: &str,
        encoded: &str,
        show: bool,
        fit: bool,
    ) -> Result<Promise, JsValue> {
        let ticket = self.begin_load(name, version)?;
        let state = Rc::downgrade(&self.state);
        let src = normalize_data_url(encoded);
        Ok(future_to_promise(async move {
            let image = loader::decode_image(&src).await.map_err(|e| {
                log::warn!("Failed to decode image for '{}': {}", ticket.name(), e);
                JsValue::from(e)
            })?;
            finish_load(&state, &ticket, image, show, fit).map(JsValue::from_bool)
        }))
    }

    /// Fetch and decode the image at `url`, then store it.
    ///
    /// `onProgress` receives whole download percentages. Resolves to whether
    /// the image was applied.
    #[wasm_bindgen(js_name = loadImage)]
    pub fn load_image(
        &self,
        name: &str,
        version: &str,
        url: String,
        show: bool,
        fit: bool,
        on_progress: Option<Function>,
    ) -> Result<Promise, JsValue> {
        let ticket = self.begin_load(name, version)?;
        let state = Rc::downgrade(&self.state);
        Ok(future_to_promise(async move {
            let image = loader::load_image(&url, on_progress).await.map_err(|e| {
                log::warn!("Failed to load {} for '{}': {}", url, ticket.name(), e);
                JsValue::from(e)
            })?;
            finish_load(&state, &ticket, image, show, fit).map(JsValue::from_bool)
        }))
    }

    /// Show version "a", "b", or "split" (alias "both") on every canvas.
    #[wasm_bindgen(js_name = setDisplayMode)]
    pub fn set_display_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode = mode.parse::<DisplayMode>().map_err(to_js)?;
        self.state()?.view.set_display_mode(mode).map_err(to_js)
    }

    pub fn render(&self, name: &str) -> Result<(), JsValue> {
        self.state()?.view.render(name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = renderAll)]
    pub fn render_all(&self) -> Result<(), JsValue> {
        self.state()?.view.render_all().map_err(to_js)
    }

    /// Fit the image under `name` into its canvas and recenter every canvas.
    pub fn fit(&self, name: &str) -> Result<bool, JsValue> {
        let mut state = self.state()?;
        let fitted = state.view.fit(name).map_err(to_js)?;
        if fitted {
            state.refresh_zoom_label();
        }
        Ok(fitted)
    }

    #[wasm_bindgen(js_name = setZoomRate)]
    pub fn set_zoom_rate(&self, rate: f64) -> Result<(), JsValue> {
        self.state()?.view.set_zoom_rate(rate).map_err(to_js)
    }

    /// Set the wheel zoom rate to `1 + 10^exponent`.
    #[wasm_bindgen(js_name = setZoomSensitivity)]
    pub fn set_zoom_sensitivity(&self, exponent: f64) -> Result<(), JsValue> {
        self.set_zoom_rate(GroupConfig::zoom_rate_from_sensitivity(exponent))
    }

    /// Element whose text mirrors the magnification as "NNN%". Pass nothing to detach.
    #[wasm_bindgen(js_name = setZoomLabel)]
    pub fn set_zoom_label(&self, element: Option<HtmlElement>) -> Result<(), JsValue> {
        let mut state = self.state()?;
        state.zoom_label = element;
        state.refresh_zoom_label();
        Ok(())
    }

    pub fn magnification(&self) -> Result<f64, JsValue> {
        Ok(self.state()?.view.transform().magnification)
    }

    #[wasm_bindgen(js_name = zoomText)]
    pub fn zoom_text(&self) -> Result<String, JsValue> {
        Ok(self.state()?.view.zoom_label())
    }

    /// Download the full image shown under `name` as a PNG.
    ///
    /// Returns false when nothing is stored for the current display mode.
    pub fn download(&self, name: &str) -> Result<bool, JsValue> {
        let state = self.state()?;
        let Some(target) = state.view.export_target(name) else {
            log::debug!("Nothing to download for '{}'", name);
            return Ok(false);
        };
        let url = image_data_url(target.image.element())?;
        trigger_download(&url, &target.file_name)?;
        log::info!("Downloading {}", target.file_name);
        Ok(true)
    }

    /// PNG data URL of the full image under `name` and `version`, or null.
    #[wasm_bindgen(js_name = fullImageDataUrl)]
    pub fn full_image_data_url(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<String>, JsValue> {
        let version = version.parse::<Version>().map_err(to_js)?;
        let state = self.state()?;
        state
            .view
            .image(name, version)
            .map(|image| image_data_url(image.element()))
            .transpose()
    }
}

impl SyncViewGroup {
    fn from_config(config: GroupConfig) -> Result<Self, JsValue> {
        let view = ViewGroup::new(config).map_err(to_js)?;
        Ok(Self {
            state: Rc::new(RefCell::new(GroupState {
                view,
                zoom_label: None,
            })),
            listeners: RefCell::new(HashMap::new()),
        })
    }

    fn state(&self) -> Result<RefMut<'_, GroupState>, JsValue> {
        self.state.try_borrow_mut().map_err(|_| busy())
    }

    fn begin_load(&self, name: &str, version: &str) -> Result<LoadTicket, JsValue> {
        let version = version.parse::<Version>().map_err(to_js)?;
        Ok(self.state()?.view.begin_load(name, version))
    }
}

/// Hand a decoded image to the group if both are still around and the load is current.
fn finish_load(
    state: &Weak<RefCell<GroupState>>,
    ticket: &LoadTicket,
    image: CanvasImage,
    show: bool,
    fit: bool,
) -> Result<bool, JsValue> {
    let Some(state) = state.upgrade() else {
        log::debug!("Group dropped before '{}' finished loading", ticket.name());
        return Ok(false);
    };
    let mut guard = state.try_borrow_mut().map_err(|_| busy())?;
    let applied = guard
        .view
        .finish_load(ticket, image, show, fit)
        .map_err(to_js)?;
    if applied && show && fit {
        guard.refresh_zoom_label();
    }
    Ok(applied)
}

#[cfg(test)]
mod browser_tests {
    use super::*;
    use crate::canvas_utils::create_canvas;
    use syncview_core::{GestureEvent, GestureKind};
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;
    use web_sys::{MouseEvent, MouseEventInit};

    wasm_bindgen_test_configure!(run_in_browser);

    const PIXEL_PNG: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn mouse_down(canvas: &HtmlCanvasElement, x: i32, y: i32) {
        let init = MouseEventInit::new();
        init.set_client_x(x);
        init.set_client_y(y);
        let event = MouseEvent::new_with_mouse_event_init_dict("mousedown", &init).unwrap();
        canvas.dispatch_event(&event).unwrap();
    }

    fn record_drag_starts(group: &SyncViewGroup, name: &str) -> Rc<RefCell<Vec<GestureEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        group
            .state
            .borrow()
            .view
            .on_gesture(name, GestureKind::DragStart, move |event| {
                sink.borrow_mut().push(*event)
            })
            .unwrap();
        seen
    }

    #[wasm_bindgen_test]
    fn registering_sizes_canvas_buffer() {
        let group = SyncViewGroup::new(Some(100)).unwrap();
        let canvas = create_canvas(10, 10).unwrap();
        group.register_canvas("ours", canvas.clone()).unwrap();

        assert_eq!((canvas.width(), canvas.height()), (200, 200));
    }

    #[wasm_bindgen_test]
    fn config_object_is_validated() {
        let config = js_sys::JSON::parse(r#"{"zoom_rate": 0.5}"#).unwrap();
        assert!(SyncViewGroup::with_config(config).is_err());

        let config = js_sys::JSON::parse(r#"{"viewport_size": 64}"#).unwrap();
        assert!(SyncViewGroup::with_config(config).is_ok());
        assert!(SyncViewGroup::with_config(JsValue::UNDEFINED).is_ok());
    }

    #[wasm_bindgen_test]
    fn unknown_names_throw() {
        let group = SyncViewGroup::new(None).unwrap();
        group
            .register_canvas("ours", create_canvas(1, 1).unwrap())
            .unwrap();

        assert!(group.on("ours", "doubletap", Function::new_no_args("")).is_err());
        assert!(group.on("ours", "dragstart", Function::new_no_args("")).is_ok());
        assert!(group.on("theirs", "dragstart", Function::new_no_args("")).is_err());
        assert!(group.set_display_mode("sideways").is_err());
        assert!(group.set_display_mode("both").is_ok());
    }

    #[wasm_bindgen_test]
    fn mouse_input_reaches_subscribers() {
        let group = SyncViewGroup::new(None).unwrap();
        let canvas = create_canvas(1, 1).unwrap();
        group.register_canvas("ours", canvas.clone()).unwrap();
        let seen = record_drag_starts(&group, "ours");

        mouse_down(&canvas, 10, 20);

        // A detached canvas sits at the page origin.
        assert_eq!(*seen.borrow(), vec![GestureEvent::DragStart { x: 10.0, y: 20.0 }]);
    }

    #[wasm_bindgen_test]
    fn replaced_canvas_stops_routing_input() {
        let group = SyncViewGroup::new(None).unwrap();
        let old_canvas = create_canvas(1, 1).unwrap();
        let new_canvas = create_canvas(1, 1).unwrap();
        group.register_canvas("ours", old_canvas.clone()).unwrap();
        group.register_canvas("ours", new_canvas.clone()).unwrap();
        let seen = record_drag_starts(&group, "ours");

        mouse_down(&old_canvas, 5, 5);
        assert!(seen.borrow().is_empty());

        mouse_down(&new_canvas, 5, 5);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[wasm_bindgen_test]
    fn missing_images_export_nothing() {
        let group = SyncViewGroup::new(None).unwrap();

        assert!(!group.download("ours").unwrap());
        assert_eq!(group.full_image_data_url("ours", "a").unwrap(), None);
    }

    #[wasm_bindgen_test]
    async fn base64_image_is_stored_and_fitted() {
        let group = SyncViewGroup::new(Some(2)).unwrap();
        group
            .register_canvas("ours", create_canvas(1, 1).unwrap())
            .unwrap();

        let promise = group
            .set_image_base64("ours", "both", PIXEL_PNG, true, true)
            .unwrap();
        let applied = JsFuture::from(promise).await.unwrap();

        assert_eq!(applied.as_bool(), Some(true));
        // 1x1 image in a 4px buffer
        assert_eq!(group.magnification().unwrap(), 4.0);
        assert_eq!(group.zoom_text().unwrap(), "400%");
        let url = group.full_image_data_url("ours", "a").unwrap().unwrap();
        assert!(url.starts_with("data:image/png"));
    }
}
