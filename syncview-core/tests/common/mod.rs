#![allow(dead_code)]

use syncview_core::{Bitmap, GroupConfig, Rect, RenderSurface, ViewError, ViewGroup};

#[derive(Clone, Debug, PartialEq)]
pub struct TestImage {
    pub id: &'static str,
    pub width: u32,
    pub height: u32,
}

impl TestImage {
    pub fn new(id: &'static str, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}

impl Bitmap for TestImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Reset(u32, u32),
    Image {
        id: &'static str,
        source: Rect,
        target: Rect,
    },
    Divider(f64, f64),
}

/// Surface double that records every drawing call.
pub struct RecordingSurface {
    pub bounds: Rect,
    pub calls: Vec<DrawCall>,
    pub fail_draws: bool,
}

impl RecordingSurface {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            calls: Vec::new(),
            fail_draws: false,
        }
    }

    pub fn failing(bounds: Rect) -> Self {
        Self {
            fail_draws: true,
            ..Self::new(bounds)
        }
    }

    /// Calls made since the most recent reset, inclusive.
    pub fn last_frame(&self) -> &[DrawCall] {
        let start = self
            .calls
            .iter()
            .rposition(|call| matches!(call, DrawCall::Reset(..)))
            .unwrap_or(0);
        &self.calls[start..]
    }

    pub fn frame_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Reset(..)))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    type Image = TestImage;

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn reset(&mut self, width: u32, height: u32) -> Result<(), ViewError> {
        self.calls.push(DrawCall::Reset(width, height));
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &TestImage,
        source: &Rect,
        target: &Rect,
    ) -> Result<(), ViewError> {
        if self.fail_draws {
            return Err(ViewError::Surface("draw rejected".to_string()));
        }
        self.calls.push(DrawCall::Image {
            id: image.id,
            source: *source,
            target: *target,
        });
        Ok(())
    }

    fn draw_divider(&mut self, x: f64, height: f64) -> Result<(), ViewError> {
        self.calls.push(DrawCall::Divider(x, height));
        Ok(())
    }
}

/// Surface bounds used throughout: a 300x300 box at the page origin.
pub fn square_bounds() -> Rect {
    Rect::new(0.0, 0.0, 300.0, 300.0)
}

/// Group with the default 150px viewport and the given surfaces registered.
pub fn group_with(config: GroupConfig, names: &[&str]) -> ViewGroup<RecordingSurface> {
    let mut group = ViewGroup::new(config).unwrap();
    for name in names {
        group
            .register_surface(name, RecordingSurface::new(square_bounds()))
            .unwrap();
    }
    group
}
