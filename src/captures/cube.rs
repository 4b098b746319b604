//! Spinning cubes driven by a camera matrix that is rotated a little on
//! every tick.

use std::time::Duration;

use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};

use super::{scene_projection, upload_attribute, upload_indices, Capture, CaptureOptions};
use crate::gl::{
    Capability, ClearMask, GlCanvas, IndexBuffer, Primitive, ProgramDescriptor, ShaderProgram,
    VertexPointer,
};
use crate::{math, shapes};

const VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 color;
uniform mat4 camera;
out vec4 v_color;
void main() {
  gl_Position = camera * position;
  v_color = color;
}
";

const FRAGMENT: &str = "#version 300 es
precision mediump float;
in vec4 v_color;
out vec4 fragColor;
void main() {
  fragColor = v_color;
}
";

/// Eight corners, interleaved `x, y, z, r, g, b`.
#[rustfmt::skip]
const CORNERS: [f32; 48] = [
     1.0,  1.0,  1.0,   1.0, 1.0, 1.0,
    -1.0,  1.0,  1.0,   1.0, 0.0, 1.0,
    -1.0, -1.0,  1.0,   1.0, 0.0, 0.0,
     1.0, -1.0,  1.0,   1.0, 1.0, 0.0,
     1.0, -1.0, -1.0,   0.0, 1.0, 0.0,
     1.0,  1.0, -1.0,   0.0, 1.0, 1.0,
    -1.0,  1.0, -1.0,   0.0, 0.0, 1.0,
    -1.0, -1.0, -1.0,   0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const CORNER_INDICES: [u8; 36] = [
    0, 1, 2, 0, 2, 3,
    0, 3, 4, 0, 4, 5,
    0, 5, 6, 0, 6, 1,
    1, 6, 7, 1, 7, 2,
    7, 4, 3, 7, 3, 2,
    4, 7, 6, 4, 6, 5,
];

const STRIDE: i32 = 6 * 4;

struct SpinningCube {
    canvas: GlCanvas,
    program: ShaderProgram,
    indices: IndexBuffer,
    camera: Mat4,
    step: Vec3,
    interval: Duration,
}

impl Capture for SpinningCube {
    fn interval(&self) -> Option<Duration> {
        Some(self.interval)
    }

    fn frame(&mut self) -> Result<()> {
        self.camera *= math::rotation_degrees(self.step.x, self.step.y, self.step.z);
        self.program.set_uniform("camera", self.camera)?;
        self.canvas.clear(ClearMask::COLOR_AND_DEPTH);
        self.indices.draw(Primitive::Triangles);
        Ok(())
    }
}

fn program(canvas: &GlCanvas, position: VertexPointer, color: VertexPointer) -> Result<ShaderProgram> {
    let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", position)
        .attribute("color", color)
        .uniform("camera");
    let program = canvas.create_program(&descriptor)?;
    program.use_program();
    Ok(program)
}

fn prepare_canvas(canvas: &GlCanvas) -> Mat4 {
    canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
    canvas.enable(Capability::DepthTest);
    scene_projection(canvas) * Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))
}

/// Cube with a colour per corner and byte indices.
pub(super) fn start_colored(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let program = program(
        canvas,
        VertexPointer::floats(3).with_stride(STRIDE),
        VertexPointer::floats(3).with_stride(STRIDE).with_offset(12),
    )?;
    upload_attribute(&program, "position", &CORNERS)?;
    upload_attribute(&program, "color", &CORNERS)?;
    let mut indices = canvas.create_index_buffer()?;
    indices.upload(&CORNER_INDICES);

    Ok(Box::new(SpinningCube {
        camera: prepare_canvas(canvas),
        canvas: canvas.clone(),
        program,
        indices,
        step: Vec3::new(0.4, 0.8, 0.4),
        interval: Duration::from_millis(16),
    }))
}

/// The generated cube mesh, its face normals shown as colours.
pub(super) fn start_mesh(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let mesh = shapes::cube();
    let program = program(canvas, VertexPointer::floats(3), VertexPointer::floats(3))?;
    upload_attribute(&program, "position", &mesh.positions)?;
    upload_attribute(&program, "color", &mesh.normals)?;
    let indices = upload_indices(canvas, &mesh.indices)?;

    Ok(Box::new(SpinningCube {
        camera: prepare_canvas(canvas),
        canvas: canvas.clone(),
        program,
        indices,
        step: Vec3::new(0.4, 0.8, 0.4),
        interval: Duration::from_millis(100),
    }))
}
