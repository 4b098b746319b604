use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};

use super::{upload_attribute, Capture, CaptureOptions, Still};
use crate::gl::{ClearMask, GlCanvas, Primitive, ProgramDescriptor, VertexPointer};

const VERTEX: &str = "#version 300 es
in vec4 position;
uniform mat4 translation;
uniform mat4 rotation;
uniform mat4 scale;
void main() {
  gl_Position = translation * rotation * scale * position;
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

const VERTICES: [f32; 6] = [0.0, 0.5, -0.5, -0.5, 0.5, -0.5];

fn translation() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.8, -0.6, 0.0))
}

/// Radians about the z axis.
fn rotation() -> Mat4 {
    Mat4::from_rotation_z(0.7)
}

fn scale() -> Mat4 {
    Mat4::from_scale(Vec3::splat(0.4))
}

pub(super) fn start(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", VertexPointer::floats(2))
        .uniforms(["color", "translation", "rotation", "scale"]);
    let program = canvas.create_program(&descriptor)?;
    program.use_program();
    program.set_uniform("color", Vec4::new(1.0, 0.0, 0.0, 1.0))?;
    program.set_uniform("translation", translation())?;
    program.set_uniform("rotation", rotation())?;
    program.set_uniform("scale", scale())?;
    upload_attribute(&program, "position", &VERTICES)?;

    canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
    canvas.clear(ClearMask::COLOR);
    canvas.draw_arrays(Primitive::Triangles, 0, 3);
    Ok(Still::boxed(program))
}
