//! Render planning: which source windows go where in a surface's buffer.
//!
//! Planning is pure so it can be checked without a drawing backend; a
//! [`RenderPlan`] is then replayed onto any [`RenderSurface`].

use crate::geometry::Rect;
use crate::payload::{Bitmap, DisplayMode, ImagePayload, Version};
use crate::surface::RenderSurface;
use crate::transform::ViewTransform;
use crate::ViewError;

/// Copy `source` (bitmap pixels) into `target` (buffer pixels), scaling as needed.
#[derive(Debug, PartialEq)]
pub struct DrawCommand<'a, B> {
    pub image: &'a B,
    pub version: Version,
    pub source: Rect,
    pub target: Rect,
}

#[derive(Debug, PartialEq)]
pub struct RenderPlan<'a, B> {
    /// Whole backing buffer, `2 * viewport_size` square.
    pub buffer: Rect,
    pub draws: Vec<DrawCommand<'a, B>>,
    /// X position of the 1px split divider, if any.
    pub divider: Option<f64>,
}

impl<'a, B: Bitmap> RenderPlan<'a, B> {
    pub fn build(
        payload: &'a ImagePayload<B>,
        mode: DisplayMode,
        transform: &ViewTransform,
        viewport_size: u32,
    ) -> Self {
        let side = 2.0 * viewport_size as f64;
        let buffer = Rect::new(0.0, 0.0, side, side);

        if mode == DisplayMode::Split {
            if let Some((a, b)) = payload.pair() {
                // Both halves sample the window computed from version A.
                let window = transform.source_window(a.width(), a.height(), viewport_size);
                return Self {
                    buffer,
                    draws: vec![
                        DrawCommand {
                            image: a,
                            version: Version::A,
                            source: window.left_half(),
                            target: buffer.left_half(),
                        },
                        DrawCommand {
                            image: b,
                            version: Version::B,
                            source: window.right_half(),
                            target: buffer.right_half(),
                        },
                    ],
                    divider: Some(viewport_size as f64),
                };
            }
        }

        let version = match mode {
            DisplayMode::B => Version::B,
            DisplayMode::A | DisplayMode::Split => Version::A,
        };
        let draws = payload
            .resolve(version)
            .map(|image| DrawCommand {
                image,
                version,
                source: transform.source_window(image.width(), image.height(), viewport_size),
                target: buffer,
            })
            .into_iter()
            .collect();

        Self {
            buffer,
            draws,
            divider: None,
        }
    }

    /// Clear `surface` to the plan's buffer size and draw every command.
    pub fn execute<S>(&self, surface: &mut S) -> Result<(), ViewError>
    where
        S: RenderSurface<Image = B>,
    {
        surface.reset(self.buffer.width as u32, self.buffer.height as u32)?;
        for draw in &self.draws {
            surface.draw_image(draw.image, &draw.source, &draw.target)?;
        }
        if let Some(x) = self.divider {
            surface.draw_divider(x, self.buffer.height)?;
        }
        Ok(())
    }
}
