use std::time::Duration;

use anyhow::Result;
use glam::Vec4;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Capture, CaptureOptions};
use crate::gl::{
    AttribValue, ClearMask, GlCanvas, Primitive, ProgramDescriptor, ShaderProgram, VertexPointer,
};

const VERTEX: &str = "#version 300 es
in vec4 position;
in float size;
void main() {
  gl_Position = position;
  gl_PointSize = size;
}
";

const FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform vec4 color;
out vec4 fragColor;
void main() {
  fragColor = color;
}
";

/// A single red point jumping to a random spot twice a second. Both
/// coordinates are drawn from `0..1`, so the point stays in the upper-right
/// quadrant of clip space.
struct Point {
    canvas: GlCanvas,
    program: ShaderProgram,
    rng: StdRng,
}

pub(super) fn start(canvas: &GlCanvas, options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", VertexPointer::floats(4))
        .attribute("size", VertexPointer::floats(1))
        .uniform("color");
    let program = canvas.create_program(&descriptor)?;
    program.use_program();
    program.set_uniform("color", Vec4::new(1.0, 0.0, 0.0, 1.0))?;
    program
        .attribute("size")?
        .set_constant(AttribValue::F1(10.0));
    canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));

    Ok(Box::new(Point {
        canvas: canvas.clone(),
        program,
        rng: StdRng::seed_from_u64(options.seed),
    }))
}

impl Capture for Point {
    fn interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }

    fn frame(&mut self) -> Result<()> {
        let position = Vec4::new(
            self.rng.gen_range(0.0..1.0),
            self.rng.gen_range(0.0..1.0),
            0.0,
            1.0,
        );
        trace!("point moved to ({:.2}, {:.2})", position.x, position.y);
        self.program
            .attribute("position")?
            .set_constant(AttribValue::F4(position));
        self.canvas.clear(ClearMask::COLOR);
        self.canvas.draw_arrays(Primitive::Points, 0, 1);
        Ok(())
    }
}
