use anyhow::Result;
use glam::Vec4;

use super::{upload_attribute, Capture, CaptureOptions, Still};
use crate::gl::{ClearMask, GlCanvas, Primitive, ProgramDescriptor, VertexPointer};

const VERTEX: &str = "#version 300 es
in vec4 position;
void main() {
  gl_Position = position;
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

const VERTICES: [f32; 9] = [0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0];

pub(super) fn start(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", VertexPointer::floats(3))
        .uniform("color");
    let program = canvas.create_program(&descriptor)?;
    program.use_program();
    program.set_uniform("color", Vec4::new(0.9, 0.5, 0.1, 1.0))?;
    upload_attribute(&program, "position", &VERTICES)?;

    canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
    canvas.clear(ClearMask::COLOR);
    canvas.draw_arrays(Primitive::Triangles, 0, VERTICES.len() as i32 / 3);
    Ok(Still::boxed(program))
}
