use std::sync::Arc;

use glam::Vec4;
use log::info;

use super::buffer::IndexBuffer;
use super::context::{Capability, ClearMask, Primitive, SharedContext};
use super::error::{GlError, GlResult};
use super::program::{ProgramDescriptor, ShaderProgram};
use super::recording::RecordingContext;
use super::texture::Texture;

/// Width and height of the drawing surface the captures are written for.
pub const DEFAULT_CANVAS_SIZE: u32 = 400;

/// A drawing surface and the context that renders into it.
///
/// All wrappers created through the canvas share its context.
#[derive(Clone)]
pub struct GlCanvas {
    context: SharedContext,
    width: u32,
    height: u32,
}

impl GlCanvas {
    /// Wraps `context` and sets the viewport to cover the whole surface.
    pub fn new(context: SharedContext, width: u32, height: u32) -> GlResult<Self> {
        if width == 0 || height == 0 {
            return Err(GlError::ContextUnavailable(format!(
                "canvas has zero area ({width}x{height})"
            )));
        }
        context.viewport(0, 0, width as i32, height as i32);
        info!("canvas ready at {width}x{height}");
        Ok(Self {
            context,
            width,
            height,
        })
    }

    /// Canvas backed by a [`RecordingContext`], which is returned alongside
    /// for inspection.
    pub fn headless(width: u32, height: u32) -> GlResult<(Self, Arc<RecordingContext>)> {
        let recording = Arc::new(RecordingContext::new(width, height)?);
        let canvas = Self::new(recording.clone(), width, height)?;
        Ok((canvas, recording))
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn create_program(&self, descriptor: &ProgramDescriptor) -> GlResult<ShaderProgram> {
        ShaderProgram::new(self.context.clone(), descriptor)
    }

    pub fn create_texture(&self, unit: u32) -> GlResult<Texture> {
        Texture::new(self.context.clone(), unit)
    }

    pub fn create_index_buffer(&self) -> GlResult<IndexBuffer> {
        IndexBuffer::new(self.context.clone())
    }

    pub fn clear_color(&self, color: Vec4) {
        self.context.clear_color(color);
    }

    pub fn enable(&self, capability: Capability) {
        self.context.enable(capability);
    }

    pub fn clear(&self, mask: ClearMask) {
        self.context.clear(mask);
    }

    pub fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        self.context.draw_arrays(mode, first, count);
    }
}

impl std::fmt::Debug for GlCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::recording::ObjectKind;

    #[test]
    fn headless_canvas_covers_the_surface() {
        let (canvas, recording) = GlCanvas::headless(400, 300).unwrap();
        assert_eq!(recording.viewport_rect(), [0, 0, 400, 300]);
        assert!((canvas.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_area_is_unavailable() {
        assert!(matches!(
            GlCanvas::headless(400, 0),
            Err(GlError::ContextUnavailable(_))
        ));
    }

    #[test]
    fn wrappers_share_the_context() {
        let (canvas, recording) = GlCanvas::headless(4, 4).unwrap();
        let texture = canvas.create_texture(1).unwrap();
        let indices = canvas.create_index_buffer().unwrap();
        assert_eq!(recording.counts(ObjectKind::Texture).created, 1);
        assert_eq!(recording.counts(ObjectKind::Buffer).created, 1);
        drop((texture, indices));
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn enable_and_clear_are_forwarded() {
        let (canvas, recording) = GlCanvas::headless(4, 4).unwrap();
        canvas.enable(Capability::DepthTest);
        canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        canvas.clear(ClearMask::COLOR_AND_DEPTH);
        assert!(recording.is_enabled(Capability::DepthTest));
        assert_eq!(recording.draw_calls()[0].describe(), "clear color+depth");
    }
}
