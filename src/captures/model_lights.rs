//! Captures that light meshes placed by a model matrix.

use std::time::Duration;

use anyhow::Result;
use glam::{Mat4, Vec3};

use super::lighting::{tilted_camera, LitMesh};
use super::{scene_projection, Capture, CaptureOptions, Still};
use crate::gl::{ClearMask, GlCanvas};
use crate::model::draw_model;
use crate::{math, shapes};

const VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
in vec4 color;
uniform mat4 model;
uniform mat4 mvp;
uniform mat4 inverseTranspose;
out vec3 v_position;
out vec3 v_normal;
out vec4 v_color;
void main() {
  gl_Position = mvp * position;
  v_position = vec3(model * position);
  v_normal = normalize(vec3(inverseTranspose * normal));
  v_color = color;
}
";

const FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform vec3 lightColor;
uniform vec3 lightPosition;
uniform vec3 ambientLight;
in vec3 v_position;
in vec3 v_normal;
in vec4 v_color;
out vec4 fragColor;
void main() {
  vec3 normal = normalize(v_normal);
  vec3 toLight = normalize(lightPosition - v_position);
  float nDotL = max(dot(toLight, normal), 0.0);
  vec3 diffuse = lightColor * v_color.rgb * nDotL;
  vec3 ambient = ambientLight * v_color.rgb;
  fragColor = vec4(diffuse + ambient, v_color.a);
}
";

const UNIFORMS: [&str; 6] = [
    "model",
    "mvp",
    "inverseTranspose",
    "lightColor",
    "lightPosition",
    "ambientLight",
];

fn lit_cube(canvas: &GlCanvas, light_position: Vec3, ambient: f32) -> Result<LitMesh> {
    let lit = LitMesh::new(
        canvas,
        VERTEX,
        FRAGMENT,
        &UNIFORMS,
        &shapes::cube(),
        Vec3::new(1.0, 0.0, 0.0),
    )?;
    lit.program.set_uniform("lightColor", Vec3::ONE)?;
    lit.program.set_uniform("lightPosition", light_position)?;
    lit.program.set_uniform("ambientLight", Vec3::splat(ambient))?;
    Ok(lit)
}

/// A cube turning about the y axis, half a degree per tick.
struct TransformModel {
    canvas: GlCanvas,
    lit: LitMesh,
    camera: Mat4,
    angle: f32,
}

pub(super) fn start_transform_model(
    canvas: &GlCanvas,
    _options: &CaptureOptions,
) -> Result<Box<dyn Capture>> {
    let lit = lit_cube(canvas, Vec3::splat(1.5), 0.1)?;
    Ok(Box::new(TransformModel {
        canvas: canvas.clone(),
        lit,
        camera: tilted_camera(canvas, 30.0, -30.0),
        angle: 0.0,
    }))
}

impl Capture for TransformModel {
    fn interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(16))
    }

    fn frame(&mut self) -> Result<()> {
        self.angle = (self.angle + 0.5) % 360.0;
        let model = math::rotation_degrees(0.0, self.angle, 0.0);
        self.canvas.clear(ClearMask::COLOR_AND_DEPTH);
        draw_model(&self.lit.program, &self.camera, &model, &self.lit.indices)?;
        Ok(())
    }
}

/// Placement and scale of the three cubes.
const CUBES: [(Vec3, Vec3); 3] = [
    (Vec3::new(-4.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 3.0)),
    (Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
    (Vec3::new(4.0, 0.0, 0.0), Vec3::new(1.0, 3.0, 1.0)),
];

/// One cube mesh drawn three times with different model matrices.
pub(super) fn start_cubes(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    let lit = lit_cube(canvas, Vec3::new(0.0, 0.0, 2.5), 0.3)?;
    let camera = scene_projection(canvas) * Mat4::from_translation(Vec3::new(0.0, 0.0, -12.0));
    canvas.clear(ClearMask::COLOR_AND_DEPTH);
    for (translation, scale) in CUBES {
        let model = Mat4::from_translation(translation)
            * math::rotation_degrees(30.0, 0.0, 0.0)
            * math::rotation_degrees(0.0, 30.0, 0.0)
            * Mat4::from_scale(scale);
        draw_model(&lit.program, &camera, &model, &lit.indices)?;
    }
    Ok(Still::boxed(lit))
}
