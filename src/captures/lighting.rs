//! Lit meshes: the shared setup plus the point, spot and specular light
//! captures.

use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};

use super::{scene_projection, upload_attribute, upload_indices, Capture, CaptureOptions, Still};
use crate::gl::{
    AttribValue, Capability, ClearMask, GlCanvas, IndexBuffer, Primitive, ProgramDescriptor,
    ShaderProgram, VertexPointer,
};
use crate::math;
use crate::shapes::{self, Mesh};

/// A program fed with a mesh's positions and normals plus a constant colour.
pub(super) struct LitMesh {
    pub program: ShaderProgram,
    pub indices: IndexBuffer,
}

impl LitMesh {
    /// Compiles the program, uploads `mesh` and prepares a depth-tested
    /// canvas. The program is left in use.
    pub fn new(
        canvas: &GlCanvas,
        vertex: &str,
        fragment: &str,
        uniforms: &[&str],
        mesh: &Mesh,
        color: Vec3,
    ) -> Result<Self> {
        mesh.validate()?;
        let descriptor = ProgramDescriptor::new(vertex, fragment)
            .attribute("position", VertexPointer::floats(3))
            .attribute("normal", VertexPointer::floats(3))
            .attribute("color", VertexPointer::floats(3))
            .uniforms(uniforms.iter().copied());
        let program = canvas.create_program(&descriptor)?;
        program.use_program();
        upload_attribute(&program, "position", &mesh.positions)?;
        upload_attribute(&program, "normal", &mesh.normals)?;
        program
            .attribute("color")?
            .set_constant(AttribValue::F3(color));
        let indices = upload_indices(canvas, &mesh.indices)?;

        canvas.clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        canvas.enable(Capability::DepthTest);
        Ok(Self { program, indices })
    }

    /// Clears colour and depth and draws the whole mesh.
    pub fn draw(&self, canvas: &GlCanvas) {
        canvas.clear(ClearMask::COLOR_AND_DEPTH);
        self.indices.draw(Primitive::Triangles);
    }
}

/// Camera looking down on the scene from above and to the side.
pub(super) fn tilted_camera(canvas: &GlCanvas, pitch: f32, yaw: f32) -> Mat4 {
    scene_projection(canvas)
        * Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))
        * math::rotation_degrees(pitch, 0.0, 0.0)
        * math::rotation_degrees(0.0, yaw, 0.0)
}

/// Interpolated world position and normal for per-fragment lighting.
const POSITIONAL_VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
in vec4 color;
uniform mat4 camera;
out vec3 v_position;
out vec3 v_normal;
out vec4 v_color;
void main() {
  gl_Position = camera * position;
  v_position = position.xyz;
  v_normal = normal.xyz;
  v_color = color;
}
";

const POINT_FRAGMENT: &str = "#version 300 es
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

const SPOT_FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform vec3 lightColor;
uniform vec3 lightPosition;
uniform vec3 ambientLight;
uniform vec3 spotDirection;
uniform float spotAngle;
in vec3 v_position;
in vec3 v_normal;
in vec4 v_color;
out vec4 fragColor;
void main() {
  vec3 normal = normalize(v_normal);
  vec3 toLight = normalize(lightPosition - v_position);
  float inCone = dot(toLight, normalize(-spotDirection)) >= spotAngle ? 1.0 : 0.0;
  float nDotL = max(dot(toLight, normal), 0.0) * inCone;
  vec3 diffuse = lightColor * v_color.rgb * nDotL;
  vec3 ambient = ambientLight * v_color.rgb;
  fragColor = vec4(diffuse + ambient, v_color.a);
}
";

/// Phong shading in view space with a separate projection uniform.
const SPECULAR_VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
in vec4 color;
uniform mat4 perspective;
uniform mat4 camera;
out vec3 v_position;
out vec3 v_normal;
out vec4 v_color;
void main() {
  vec4 viewPosition = camera * position;
  gl_Position = perspective * viewPosition;
  v_position = viewPosition.xyz;
  v_normal = mat3(camera) * normal.xyz;
  v_color = color;
}
";

const SPECULAR_FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform vec3 lightposition;
in vec3 v_position;
in vec3 v_normal;
in vec4 v_color;
out vec4 fragColor;
void main() {
  vec3 normal = normalize(v_normal);
  vec3 toLight = normalize(lightposition - v_position);
  vec3 toEye = normalize(-v_position);
  vec3 reflected = reflect(-toLight, normal);
  float diffuse = max(dot(normal, toLight), 0.0);
  float specular = pow(max(dot(reflected, toEye), 0.0), 32.0);
  fragColor = vec4(v_color.rgb * (0.2 + diffuse) + vec3(specular), 1.0);
}
";

pub(super) fn start_point_light(
    canvas: &GlCanvas,
    _options: &CaptureOptions,
) -> Result<Box<dyn Capture>> {
    let lit = LitMesh::new(
        canvas,
        POSITIONAL_VERTEX,
        POINT_FRAGMENT,
        &["camera", "lightColor", "lightPosition", "ambientLight"],
        &shapes::cube(),
        Vec3::ONE,
    )?;
    let program = &lit.program;
    program.set_uniform("camera", tilted_camera(canvas, 40.0, -45.0))?;
    program.set_uniform("lightColor", Vec3::splat(0.8))?;
    program.set_uniform("lightPosition", Vec3::new(1.0, 2.5, 2.0))?;
    program.set_uniform("ambientLight", Vec3::splat(0.3))?;
    lit.draw(canvas);
    Ok(Still::boxed(lit))
}

pub(super) fn start_spot_light(
    canvas: &GlCanvas,
    _options: &CaptureOptions,
) -> Result<Box<dyn Capture>> {
    let lit = LitMesh::new(
        canvas,
        POSITIONAL_VERTEX,
        SPOT_FRAGMENT,
        &[
            "camera",
            "lightColor",
            "lightPosition",
            "ambientLight",
            "spotDirection",
            "spotAngle",
        ],
        &shapes::cube(),
        Vec3::ONE,
    )?;
    let program = &lit.program;
    program.set_uniform("camera", tilted_camera(canvas, 40.0, -45.0))?;
    program.set_uniform("lightColor", Vec3::ONE)?;
    program.set_uniform("lightPosition", Vec3::new(1.4, 1.3, 1.5))?;
    program.set_uniform("ambientLight", Vec3::splat(0.2))?;
    program.set_uniform("spotDirection", Vec3::new(-1.0, -1.0, -1.0))?;
    program.set_uniform("spotAngle", 20.0_f32.to_radians().cos())?;
    lit.draw(canvas);
    Ok(Still::boxed(lit))
}

pub(super) fn start_specular(
    canvas: &GlCanvas,
    _options: &CaptureOptions,
) -> Result<Box<dyn Capture>> {
    let lit = LitMesh::new(
        canvas,
        SPECULAR_VERTEX,
        SPECULAR_FRAGMENT,
        &["perspective", "camera", "lightposition"],
        &shapes::cube(),
        Vec3::new(1.0, 0.0, 0.0),
    )?;
    let camera =
        Mat4::from_translation(Vec3::new(0.0, 0.0, -3.5)) * math::rotation_degrees(0.0, -30.0, 0.0);
    let program = &lit.program;
    program.set_uniform("perspective", scene_projection(canvas))?;
    program.set_uniform("camera", camera)?;
    program.set_uniform("lightposition", Vec3::new(0.0, 0.0, 1.5))?;
    lit.draw(canvas);
    Ok(Still::boxed(lit))
}
