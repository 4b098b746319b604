//! A white sphere under a directional light, with and without ambient light.

use anyhow::Result;
use glam::Vec3;

use super::lighting::{tilted_camera, LitMesh};
use super::{Capture, CaptureOptions, Still};
use crate::gl::GlCanvas;
use crate::shapes;

const SPHERE_PRECISION: u32 = 50;

const DIFFUSE_VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
in vec4 color;
uniform mat4 camera;
uniform vec3 lightColor;
uniform vec3 lightDirection;
out vec4 v_color;
void main() {
  gl_Position = camera * position;
  float nDotL = max(dot(normalize(lightDirection), normalize(normal.xyz)), 0.0);
  v_color = vec4(lightColor * color.rgb * nDotL, color.a);
}
";

const AMBIENT_VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
in vec4 color;
uniform mat4 camera;
uniform vec3 lightColor;
uniform vec3 lightDirection;
uniform vec3 ambientLight;
out vec4 v_color;
void main() {
  gl_Position = camera * position;
  float nDotL = max(dot(normalize(lightDirection), normalize(normal.xyz)), 0.0);
  vec3 diffuse = lightColor * color.rgb * nDotL;
  v_color = vec4(diffuse + ambientLight * color.rgb, color.a);
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

fn start(canvas: &GlCanvas, vertex: &str, ambient: Option<Vec3>) -> Result<Box<dyn Capture>> {
    let mut uniforms = vec!["camera", "lightColor", "lightDirection"];
    if ambient.is_some() {
        uniforms.push("ambientLight");
    }
    let mesh = shapes::sphere(SPHERE_PRECISION)?;
    let lit = LitMesh::new(canvas, vertex, FRAGMENT, &uniforms, &mesh, Vec3::ONE)?;

    let program = &lit.program;
    program.set_uniform("camera", tilted_camera(canvas, 40.0, -45.0))?;
    program.set_uniform("lightColor", Vec3::ONE)?;
    program.set_uniform("lightDirection", Vec3::new(0.2, 0.8, 0.8))?;
    if let Some(ambient) = ambient {
        program.set_uniform("ambientLight", ambient)?;
    }
    lit.draw(canvas);
    Ok(Still::boxed(lit))
}

pub(super) fn start_diffuse(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    start(canvas, DIFFUSE_VERTEX, None)
}

pub(super) fn start_ambient(canvas: &GlCanvas, _options: &CaptureOptions) -> Result<Box<dyn Capture>> {
    start(canvas, AMBIENT_VERTEX, Some(Vec3::splat(0.2)))
}
