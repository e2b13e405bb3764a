//! The synchronized view group.
//!
//! A [`ViewGroup`] owns one [`ViewTransform`] shared by all of its surfaces.
//! Input on any surface updates that transform and every surface is redrawn
//! from it, so panning or zooming one view moves all of them together.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::config::{validate_zoom_rate, GroupConfig};
use crate::geometry::{Point, Rect};
use crate::gesture::{GestureEvent, GestureHandlers, GestureKind, GestureSource, SurfaceInput};
use crate::loads::{LoadSequencer, LoadTicket};
use crate::payload::{Bitmap, DisplayMode, ImagePayload, Version};
use crate::render::RenderPlan;
use crate::surface::RenderSurface;
use crate::transform::{ViewTransform, ZoomPolicy};
use crate::ViewError;

struct SurfaceEntry<S> {
    surface: S,
    gestures: GestureSource,
}

/// Full-resolution image chosen for export, with its download file name.
#[derive(Debug, PartialEq)]
pub struct ExportTarget<'a, B> {
    pub file_name: String,
    pub version: Version,
    pub image: &'a B,
}

pub struct ViewGroup<S: RenderSurface> {
    config: GroupConfig,
    policy: ZoomPolicy,
    transform: ViewTransform,
    mode: DisplayMode,
    payloads: HashMap<String, ImagePayload<S::Image>>,
    surfaces: BTreeMap<String, SurfaceEntry<S>>,
    loads: LoadSequencer,
}

impl<S: RenderSurface> ViewGroup<S> {
    pub fn new(config: GroupConfig) -> Result<Self, ViewError> {
        config.validate()?;
        Ok(Self {
            policy: config.zoom_policy(),
            config,
            transform: ViewTransform::default(),
            mode: DisplayMode::default(),
            payloads: HashMap::new(),
            surfaces: BTreeMap::new(),
            loads: LoadSequencer::default(),
        })
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn zoom_label(&self) -> String {
        self.transform.zoom_label()
    }

    pub fn set_zoom_rate(&mut self, rate: f64) -> Result<(), ViewError> {
        validate_zoom_rate(rate)?;
        self.config.zoom_rate = rate;
        Ok(())
    }

    pub fn surface(&self, name: &str) -> Option<&S> {
        self.surfaces.get(name).map(|entry| &entry.surface)
    }

    pub fn surface_names(&self) -> impl Iterator<Item = &str> {
        self.surfaces.keys().map(String::as_str)
    }

    /// Register `surface` under `name`, sizing its buffer and giving it a fresh
    /// gesture source. A surface already registered under `name` is dropped
    /// together with its gesture subscribers.
    pub fn register_surface(&mut self, name: &str, mut surface: S) -> Result<(), ViewError> {
        let side = 2 * self.config.viewport_size;
        surface.reset(side, side)?;
        let entry = SurfaceEntry {
            surface,
            gestures: GestureSource::new(self.config.span_metric),
        };
        if self.surfaces.insert(name.to_string(), entry).is_some() {
            log::info!("Replaced surface '{}'", name);
        } else {
            log::info!("Registered surface '{}'", name);
        }
        Ok(())
    }

    pub fn unregister_surface(&mut self, name: &str) -> Option<S> {
        self.surfaces.remove(name).map(|entry| entry.surface)
    }

    /// Gesture subscribers of the surface under `name`.
    pub fn gesture_handlers(&self, name: &str) -> Option<Rc<GestureHandlers>> {
        self.surfaces.get(name).map(|entry| entry.gestures.handlers())
    }

    pub fn on_gesture(
        &self,
        name: &str,
        kind: GestureKind,
        callback: impl Fn(&GestureEvent) + 'static,
    ) -> Result<(), ViewError> {
        let entry = self
            .surfaces
            .get(name)
            .ok_or_else(|| ViewError::UnknownSurface(name.to_string()))?;
        entry.gestures.on(kind, callback);
        Ok(())
    }

    /// Store `bitmap` under `(name, version)`.
    ///
    /// With `show`, the surface is drawn right away; with `show` and `fit`, the
    /// shared transform is first reset to fit the image and every surface is
    /// redrawn. Loads still in flight for an overlapping slot are superseded.
    pub fn set_image(
        &mut self,
        name: &str,
        version: Version,
        bitmap: S::Image,
        show: bool,
        fit: bool,
    ) -> Result<(), ViewError> {
        self.loads.begin(name, version);
        self.store(name, version, bitmap, show, fit)
    }

    /// Reserve `(name, version)` for an image that is still being decoded.
    pub fn begin_load(&mut self, name: &str, version: Version) -> LoadTicket {
        self.loads.begin(name, version)
    }

    /// Apply a decoded image if no newer request was made for its slot.
    ///
    /// Returns whether the image was stored.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        bitmap: S::Image,
        show: bool,
        fit: bool,
    ) -> Result<bool, ViewError> {
        if !self.loads.is_current(ticket) {
            log::debug!(
                "Discarding stale load for '{}' ({})",
                ticket.name(),
                ticket.version()
            );
            return Ok(false);
        }
        self.store(ticket.name(), ticket.version(), bitmap, show, fit)?;
        Ok(true)
    }

    fn store(
        &mut self,
        name: &str,
        version: Version,
        bitmap: S::Image,
        show: bool,
        fit: bool,
    ) -> Result<(), ViewError> {
        match self.payloads.get_mut(name) {
            Some(payload) => payload.set(version, bitmap),
            None => {
                self.payloads
                    .insert(name.to_string(), ImagePayload::new(version, bitmap));
            }
        }
        if !show {
            return Ok(());
        }
        if fit && self.fit(name)? {
            return Ok(());
        }
        self.render(name)
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), ViewError> {
        self.mode = mode;
        self.render_all()
    }

    /// Fit the primary image of `name` into the viewport, recenter, and redraw.
    ///
    /// Returns false when there is nothing to fit.
    pub fn fit(&mut self, name: &str) -> Result<bool, ViewError> {
        let Some(image) = self.payloads.get(name).and_then(ImagePayload::primary) else {
            return Ok(false);
        };
        let (width, height) = (image.width(), image.height());
        if !self
            .transform
            .fit(width, height, self.config.viewport_size, &self.policy)
        {
            return Ok(false);
        }
        log::debug!(
            "Fitted {}x{} image '{}' at {}",
            width,
            height,
            name,
            self.transform.zoom_label()
        );
        self.render_all()?;
        Ok(true)
    }

    /// Feed raw input for the surface `name` through its gesture source and
    /// apply the result to the shared transform, redrawing when it changed.
    ///
    /// Subscribers are not notified; see [`ViewGroup::feed`]. The returned
    /// events let a caller dispatch them once it holds no borrow of the group.
    pub fn handle_input(
        &mut self,
        name: &str,
        input: &SurfaceInput,
    ) -> Result<Vec<GestureEvent>, ViewError> {
        let entry = self
            .surfaces
            .get_mut(name)
            .ok_or_else(|| ViewError::UnknownSurface(name.to_string()))?;
        let bounds = entry.surface.bounds();

        if let SurfaceInput::Wheel { point, delta_y } = input {
            let factor = self.config.zoom_rate.powf(-delta_y);
            let anchor = anchor_offset(point.relative_to(&bounds), &bounds);
            if self.transform.zoom_at(factor, anchor, &self.policy) {
                self.render_all()?;
            }
            return Ok(Vec::new());
        }

        let events = entry.gestures.translate(input, &bounds);
        let mut changed = false;
        for event in &events {
            changed |= self.apply_gesture(event, &bounds);
        }
        if changed {
            self.render_all()?;
        }
        Ok(events)
    }

    /// Like [`ViewGroup::handle_input`], then notifies the surface's subscribers.
    pub fn feed(
        &mut self,
        name: &str,
        input: &SurfaceInput,
    ) -> Result<Vec<GestureEvent>, ViewError> {
        let events = self.handle_input(name, input)?;
        if let Some(handlers) = self.gesture_handlers(name) {
            for event in &events {
                handlers.dispatch(event);
            }
        }
        Ok(events)
    }

    fn apply_gesture(&mut self, event: &GestureEvent, bounds: &Rect) -> bool {
        match *event {
            GestureEvent::DragMove { dx, dy, .. } => {
                self.transform.pan_by(dx, dy);
                true
            }
            GestureEvent::Pinch {
                d_distance,
                center_x,
                center_y,
                dx,
                dy,
            } => {
                self.transform.pan_by(dx, dy);
                let anchor = anchor_offset(Point::new(center_x, center_y), bounds);
                self.transform.zoom_at(d_distance, anchor, &self.policy);
                true
            }
            GestureEvent::DragStart { .. } | GestureEvent::DragEnd { .. } => false,
        }
    }

    /// Draw the current window of `name`'s images into its surface.
    ///
    /// A name without a surface or without any stored image is left alone.
    pub fn render(&mut self, name: &str) -> Result<(), ViewError> {
        let Some(entry) = self.surfaces.get_mut(name) else {
            log::debug!("No surface registered for '{}'", name);
            return Ok(());
        };
        let Some(payload) = self.payloads.get(name) else {
            log::debug!("No image stored for '{}'", name);
            return Ok(());
        };
        RenderPlan::build(payload, self.mode, &self.transform, self.config.viewport_size)
            .execute(&mut entry.surface)
    }

    /// Redraw every registered surface. Every surface is attempted; the first
    /// failure is returned.
    pub fn render_all(&mut self) -> Result<(), ViewError> {
        let names: Vec<String> = self.surfaces.keys().cloned().collect();
        let mut first_error = None;
        for name in names {
            if let Err(e) = self.render(&name) {
                log::warn!("Failed to render '{}': {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// The full image to export for `name` under the current display mode.
    ///
    /// Mode B exports version B, every other mode version A, falling back to
    /// the single image. The file name carries an `A`/`B` suffix only when
    /// both versions exist.
    pub fn export_target(&self, name: &str) -> Option<ExportTarget<'_, S::Image>> {
        let payload = self.payloads.get(name)?;
        let version = match self.mode {
            DisplayMode::B => Version::B,
            DisplayMode::A | DisplayMode::Split => Version::A,
        };
        let image = payload.resolve(version)?;
        let suffix = match (payload.pair(), version) {
            (Some(_), Version::B) => "B",
            (Some(_), _) => "A",
            (None, _) => "",
        };
        Some(ExportTarget {
            file_name: format!("{name}{suffix}.png"),
            version,
            image,
        })
    }

    /// Image stored for `name` and `version`, falling back to the single image.
    pub fn image(&self, name: &str, version: Version) -> Option<&S::Image> {
        self.payloads.get(name)?.resolve(version)
    }
}

/// Offset of a surface-local point from the surface's visual center.
fn anchor_offset(local: Point, bounds: &Rect) -> Point {
    let center = bounds.pixel_center();
    Point::new(local.x - center.x, local.y - center.y)
}
