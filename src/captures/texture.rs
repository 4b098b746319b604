use anyhow::Result;
use glam::Vec4;

use super::{upload_attribute, Capture, CaptureOptions, Still};
use crate::gl::{
    ClearMask, GlCanvas, ImageSource, Primitive, ProgramDescriptor, VertexPointer,
};

const VERTEX: &str = "#version 300 es
in vec4 position;
in vec2 texCoord;
out vec2 v_texCoord;
void main() {
  gl_Position = position;
  v_texCoord = texCoord;
}
";

const FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform sampler2D sampler;
in vec2 v_texCoord;
out vec4 fragColor;
void main() {
  fragColor = texture(sampler, v_texCoord);
}
";

/// Interleaved `x, y, u, v` for a quad drawn as a strip.
const VERTICES: [f32; 16] = [
    -0.5, 0.5, 0.0, 1.0, //
    -0.5, -0.5, 0.0, 0.0, //
    0.5, 0.5, 1.0, 1.0, //
    0.5, -0.5, 1.0, 0.0,
];

const STRIDE: i32 = 4 * 4;

pub(super) fn start(canvas: &GlCanvas, options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let image = options
        .image
        .clone()
        .unwrap_or_else(|| ImageSource::checkerboard(64, 8, [230, 230, 230, 255], [40, 90, 160, 255]));

    let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", VertexPointer::floats(2).with_stride(STRIDE))
        .attribute(
            "texCoord",
            VertexPointer::floats(2).with_stride(STRIDE).with_offset(8),
        )
        .uniform("sampler");
    let program = canvas.create_program(&descriptor)?;
    program.use_program();
    upload_attribute(&program, "position", &VERTICES)?;
    upload_attribute(&program, "texCoord", &VERTICES)?;

    let texture = canvas.create_texture(0)?;
    texture.bind_image(&image);
    texture.bind_to_uniform(program.uniform("sampler")?);

    canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
    canvas.clear(ClearMask::COLOR);
    canvas.draw_arrays(Primitive::TriangleStrip, 0, 4);
    Ok(Still::boxed((program, texture)))
}
