//! Shared pan/zoom state of a view group.
//!
//! Pan is measured in source-image pixels relative to the image's own center,
//! so the same transform can be applied to bitmaps of different sizes.
//! Magnification is a multiplicative scale: at magnification `m` a surface of
//! half side `S` shows a source window of half side `S / m`.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// How the pan correction of an anchored zoom step is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// `rel = anchor / magnification` evaluated after the magnification update.
    /// The content under the anchor drifts towards the center by a factor of `1 / zf`.
    #[default]
    Reference,
    /// `rel = anchor / magnification` evaluated before the update.
    /// The content under the anchor stays at the same surface pixel.
    Exact,
}

/// Limits and anchoring rule applied to every zoom step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomPolicy {
    pub min_magnification: f64,
    pub max_magnification: f64,
    pub anchor: AnchorMode,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            min_magnification: crate::config::DEFAULT_MIN_MAGNIFICATION,
            max_magnification: crate::config::DEFAULT_MAX_MAGNIFICATION,
            anchor: AnchorMode::Reference,
        }
    }
}

impl ZoomPolicy {
    fn clamp(&self, magnification: f64) -> f64 {
        magnification.clamp(self.min_magnification, self.max_magnification)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub magnification: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            magnification: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Pan by a drag delta in surface pixels.
    ///
    /// Dragging right/down moves the visible window left/up, so the content
    /// follows the pointer.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let factor = -1.0 / self.magnification;
        self.pan_x += dx * factor;
        self.pan_y += dy * factor;
    }

    /// Zoom by `factor` around `anchor`, given relative to the surface's visual center.
    ///
    /// Returns false and leaves the transform untouched when the factor is not
    /// a finite positive number. The new magnification is clamped to the policy's
    /// bounds and the pan correction uses the factor that was actually applied.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point, policy: &ZoomPolicy) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            log::debug!("Ignoring zoom factor {}", factor);
            return false;
        }

        let previous = self.magnification;
        self.magnification = policy.clamp(previous * factor);
        let applied = self.magnification / previous;

        let scale = match policy.anchor {
            AnchorMode::Reference => self.magnification,
            AnchorMode::Exact => previous,
        };
        let rel_x = anchor.x / scale;
        let rel_y = anchor.y / scale;
        self.pan_x += (1.0 - 1.0 / applied) * rel_x;
        self.pan_y += (1.0 - 1.0 / applied) * rel_y;
        true
    }

    /// Fit a `width` x `height` image inside a `2 * viewport_size` square and center it.
    ///
    /// Returns false for degenerate images, which leave the transform unchanged.
    pub fn fit(
        &mut self,
        width: u32,
        height: u32,
        viewport_size: u32,
        policy: &ZoomPolicy,
    ) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let span = 2.0 * viewport_size as f64;
        let magnification = (span / width as f64).min(span / height as f64);
        self.magnification = policy.clamp(magnification);
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        true
    }

    /// Source-image window visible through a surface of half side `viewport_size`.
    pub fn source_window(&self, image_width: u32, image_height: u32, viewport_size: u32) -> Rect {
        let center_x = (image_width / 2) as f64 + self.pan_x;
        let center_y = (image_height / 2) as f64 + self.pan_y;
        let half = viewport_size as f64 / self.magnification;
        Rect::new(center_x - half, center_y - half, 2.0 * half, 2.0 * half)
    }

    /// Source coordinate shown at `offset` from the surface's visual center.
    pub fn source_point(&self, image_width: u32, image_height: u32, offset: Point) -> Point {
        Point::new(
            (image_width / 2) as f64 + self.pan_x + offset.x / self.magnification,
            (image_height / 2) as f64 + self.pan_y + offset.y / self.magnification,
        )
    }

    /// Magnification as a whole percentage, rounded down.
    pub fn zoom_percent(&self) -> u64 {
        (self.magnification * 100.0).floor() as u64
    }

    pub fn zoom_label(&self) -> String {
        format!("{}%", self.zoom_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn exact() -> ZoomPolicy {
        ZoomPolicy {
            anchor: AnchorMode::Exact,
            ..ZoomPolicy::default()
        }
    }

    #[test]
    fn default_is_identity() {
        let t = ViewTransform::default();
        assert_eq!(t.magnification, 1.0);
        assert_eq!((t.pan_x, t.pan_y), (0.0, 0.0));
    }

    #[test]
    fn pan_moves_window_against_drag() {
        let mut t = ViewTransform {
            magnification: 2.0,
            ..ViewTransform::default()
        };
        t.pan_by(10.0, -4.0);

        assert!((t.pan_x - -5.0).abs() < EPS);
        assert!((t.pan_y - 2.0).abs() < EPS);
    }

    #[test]
    fn reference_zoom_uses_updated_magnification() {
        // m = 1, zoom 2x at (100, 50): rel = (50, 25), pan += 0.5 * rel
        let mut t = ViewTransform::default();
        assert!(t.zoom_at(2.0, Point::new(100.0, 50.0), &ZoomPolicy::default()));

        assert!((t.magnification - 2.0).abs() < EPS);
        assert!((t.pan_x - 25.0).abs() < EPS);
        assert!((t.pan_y - 12.5).abs() < EPS);
    }

    #[test]
    fn exact_zoom_uses_previous_magnification() {
        let mut t = ViewTransform::default();
        assert!(t.zoom_at(2.0, Point::new(100.0, 50.0), &exact()));

        assert!((t.pan_x - 50.0).abs() < EPS);
        assert!((t.pan_y - 25.0).abs() < EPS);
    }

    #[test]
    fn zoom_at_center_keeps_pan() {
        let mut t = ViewTransform {
            magnification: 0.5,
            pan_x: 12.0,
            pan_y: -3.0,
        };
        t.zoom_at(1.7, Point::new(0.0, 0.0), &ZoomPolicy::default());

        assert_eq!((t.pan_x, t.pan_y), (12.0, -3.0));
    }

    #[test]
    fn invalid_factors_are_ignored() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut t = ViewTransform::default();
            assert!(!t.zoom_at(factor, Point::new(5.0, 5.0), &ZoomPolicy::default()));
            assert_eq!(t, ViewTransform::default());
        }
    }

    #[test]
    fn zoom_is_clamped_to_policy_bounds() {
        let policy = ZoomPolicy {
            min_magnification: 0.5,
            max_magnification: 4.0,
            anchor: AnchorMode::Exact,
        };
        let mut t = ViewTransform::default();
        t.zoom_at(100.0, Point::new(0.0, 0.0), &policy);
        assert_eq!(t.magnification, 4.0);

        t.zoom_at(1e-6, Point::new(0.0, 0.0), &policy);
        assert_eq!(t.magnification, 0.5);
    }

    #[test]
    fn clamped_zoom_keeps_anchor_stationary() {
        let policy = ZoomPolicy {
            min_magnification: 0.5,
            max_magnification: 4.0,
            anchor: AnchorMode::Exact,
        };
        let mut t = ViewTransform {
            magnification: 3.0,
            pan_x: 7.0,
            pan_y: 1.0,
        };
        let anchor = Point::new(-40.0, 90.0);
        let before = t.source_point(800, 600, anchor);
        t.zoom_at(10.0, anchor, &policy);
        let after = t.source_point(800, 600, anchor);

        assert_eq!(t.magnification, 4.0);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_at_max_bound_does_not_pan() {
        let policy = ZoomPolicy {
            min_magnification: 0.5,
            max_magnification: 4.0,
            anchor: AnchorMode::Reference,
        };
        let mut t = ViewTransform {
            magnification: 4.0,
            pan_x: 3.0,
            pan_y: 3.0,
        };
        t.zoom_at(2.0, Point::new(100.0, 100.0), &policy);

        assert_eq!((t.pan_x, t.pan_y), (3.0, 3.0));
    }

    #[test]
    fn fit_uses_smaller_ratio_and_recenters() {
        let mut t = ViewTransform {
            magnification: 9.0,
            pan_x: 4.0,
            pan_y: 4.0,
        };
        assert!(t.fit(600, 1200, 150, &ZoomPolicy::default()));

        assert!((t.magnification - 0.25).abs() < EPS);
        assert_eq!((t.pan_x, t.pan_y), (0.0, 0.0));
    }

    #[test]
    fn fit_ignores_empty_images() {
        let mut t = ViewTransform::default();
        assert!(!t.fit(0, 100, 150, &ZoomPolicy::default()));
        assert_eq!(t, ViewTransform::default());
    }

    #[test]
    fn source_window_is_centered_on_image_plus_pan() {
        let t = ViewTransform {
            magnification: 2.0,
            pan_x: 10.0,
            pan_y: -20.0,
        };
        let window = t.source_window(401, 300, 100);

        // center = (200 + 10, 150 - 20), half side = 100 / 2
        assert_eq!(window, Rect::new(160.0, 80.0, 100.0, 100.0));
    }

    #[test]
    fn zoom_label_floors_percentage() {
        let t = ViewTransform {
            magnification: 0.4567,
            ..ViewTransform::default()
        };
        assert_eq!(t.zoom_percent(), 45);
        assert_eq!(t.zoom_label(), "45%");
    }
}
