use std::collections::BTreeMap;

use log::{debug, error};

use super::attribute::AttributeBinding;
use super::context::{
    ProgramHandle, ShaderHandle, ShaderStage, SharedContext, UniformValue, VertexPointer,
};
use super::error::{GlError, GlResult};
use super::uniform::UniformBinding;

/// Everything needed to build a [`ShaderProgram`]: both stage sources and the
/// attributes and uniforms to resolve after linking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramDescriptor {
    pub vertex_source: String,
    pub fragment_source: String,
    pub attributes: Vec<(String, VertexPointer)>,
    pub uniforms: Vec<String>,
}

impl ProgramDescriptor {
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, pointer: VertexPointer) -> Self {
        self.attributes.push((name.into(), pointer));
        self
    }

    pub fn uniform(mut self, name: impl Into<String>) -> Self {
        self.uniforms.push(name.into());
        self
    }

    pub fn uniforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uniforms.extend(names.into_iter().map(Into::into));
        self
    }
}

/// A linked program together with the attribute and uniform bindings it was
/// declared with.
///
/// Dropping it deletes the program, both shader stages and every attribute
/// buffer.
pub struct ShaderProgram {
    context: SharedContext,
    program: ProgramHandle,
    vertex_shader: ShaderHandle,
    fragment_shader: ShaderHandle,
    attributes: BTreeMap<String, AttributeBinding>,
    uniforms: BTreeMap<String, UniformBinding>,
}

impl ShaderProgram {
    /// Compiles both stages, links them and resolves the declared bindings.
    ///
    /// Every object created along the way is deleted again when any step
    /// fails.
    pub fn new(context: SharedContext, descriptor: &ProgramDescriptor) -> GlResult<Self> {
        let vertex_shader =
            compile_shader(&context, ShaderStage::Vertex, &descriptor.vertex_source)?;
        let fragment_shader =
            match compile_shader(&context, ShaderStage::Fragment, &descriptor.fragment_source) {
                Ok(shader) => shader,
                Err(err) => {
                    context.delete_shader(vertex_shader);
                    return Err(err);
                }
            };
        let program = match link_program(&context, vertex_shader, fragment_shader) {
            Ok(program) => program,
            Err(err) => {
                context.delete_shader(vertex_shader);
                context.delete_shader(fragment_shader);
                return Err(err);
            }
        };

        // From here on `Drop` releases whatever has been created.
        let mut shader_program = Self {
            context,
            program,
            vertex_shader,
            fragment_shader,
            attributes: BTreeMap::new(),
            uniforms: BTreeMap::new(),
        };
        for (name, pointer) in &descriptor.attributes {
            let binding =
                AttributeBinding::new(shader_program.context.clone(), program, name, *pointer)?;
            shader_program.attributes.insert(name.clone(), binding);
        }
        for name in &descriptor.uniforms {
            let binding = UniformBinding::new(shader_program.context.clone(), program, name)?;
            shader_program.uniforms.insert(name.clone(), binding);
        }
        debug!(
            "program linked with {} attribute(s) and {} uniform(s)",
            shader_program.attributes.len(),
            shader_program.uniforms.len()
        );
        Ok(shader_program)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.program
    }

    pub fn use_program(&self) {
        self.context.use_program(Some(self.program));
    }

    pub fn attribute(&self, name: &str) -> GlResult<&AttributeBinding> {
        self.attributes
            .get(name)
            .ok_or_else(|| GlError::AttributeNotFound {
                name: name.to_string(),
            })
    }

    pub fn attribute_mut(&mut self, name: &str) -> GlResult<&mut AttributeBinding> {
        self.attributes
            .get_mut(name)
            .ok_or_else(|| GlError::AttributeNotFound {
                name: name.to_string(),
            })
    }

    pub fn uniform(&self, name: &str) -> GlResult<&UniformBinding> {
        self.uniforms
            .get(name)
            .ok_or_else(|| GlError::UniformNotFound {
                name: name.to_string(),
            })
    }

    /// Shorthand for `uniform(name)?.set(value)`.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> GlResult<()> {
        self.uniform(name)?.set(value);
        Ok(())
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeBinding> {
        self.attributes.values()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &UniformBinding> {
        self.uniforms.values()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.context.delete_program(self.program);
        self.context.delete_shader(self.vertex_shader);
        self.context.delete_shader(self.fragment_shader);
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

fn compile_shader(
    context: &SharedContext,
    stage: ShaderStage,
    source: &str,
) -> GlResult<ShaderHandle> {
    let shader = context
        .create_shader(stage)
        .ok_or(GlError::ShaderUnavailable(stage))?;
    context.shader_source(shader, source);
    context.compile_shader(shader);
    if !context.shader_compile_status(shader) {
        let log = context.shader_info_log(shader);
        context.delete_shader(shader);
        error!("could not compile {stage} shader:\n{log}");
        return Err(GlError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

fn link_program(
    context: &SharedContext,
    vertex_shader: ShaderHandle,
    fragment_shader: ShaderHandle,
) -> GlResult<ProgramHandle> {
    let program = context.create_program().ok_or(GlError::ProgramUnavailable)?;
    context.attach_shader(program, vertex_shader);
    context.attach_shader(program, fragment_shader);
    context.link_program(program);
    if !context.program_link_status(program) {
        let log = context.program_info_log(program);
        context.delete_program(program);
        error!("could not link program:\n{log}");
        return Err(GlError::ProgramLink { log });
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat2, Mat3, Mat4, Vec2, Vec3};

    use super::*;
    use crate::gl::context::{constants, GlContext, Primitive, ScalarType};
    use crate::gl::recording::{ObjectKind, RecordingContext};

    const VERTEX: &str = "#version 300 es
in vec4 position;
in vec3 normal;
uniform mat4 camera;
out vec3 v_normal;
void main() {
  gl_Position = camera * position;
  v_normal = normal;
}";

    const FRAGMENT: &str = "#version 300 es
precision mediump float;
in vec3 v_normal;
out vec4 fragColor;
void main() {
  fragColor = vec4(v_normal, 1.0);
}";

    fn setup() -> (Arc<RecordingContext>, SharedContext) {
        let recording = Arc::new(RecordingContext::new(16, 16).unwrap());
        let shared: SharedContext = recording.clone();
        (recording, shared)
    }

    fn descriptor() -> ProgramDescriptor {
        ProgramDescriptor::new(VERTEX, FRAGMENT)
            .attribute("position", VertexPointer::floats(3))
            .attribute("normal", VertexPointer::floats(3))
            .uniform("camera")
    }

    #[test]
    fn resolves_declared_bindings() {
        let (_recording, context) = setup();
        let program = ShaderProgram::new(context, &descriptor()).unwrap();
        assert_eq!(program.attribute("position").unwrap().location(), 0);
        assert_eq!(program.attribute("normal").unwrap().location(), 1);
        assert_eq!(program.uniform("camera").unwrap().name(), "camera");
        assert_eq!(program.attributes().count(), 2);
    }

    #[test]
    fn missing_attribute_is_reported_and_cleaned_up() {
        let (recording, context) = setup();
        let descriptor = descriptor().attribute("texCoord", VertexPointer::default());
        let err = ShaderProgram::new(context, &descriptor).unwrap_err();
        assert_eq!(
            err,
            GlError::AttributeNotFound {
                name: "texCoord".into()
            }
        );
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn missing_uniform_is_reported() {
        let (recording, context) = setup();
        let err = ShaderProgram::new(context, &descriptor().uniform("lightColor")).unwrap_err();
        assert!(matches!(err, GlError::UniformNotFound { ref name } if name == "lightColor"));
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn undeclared_lookup_is_an_error() {
        let (_recording, context) = setup();
        let program = ShaderProgram::new(context, &descriptor()).unwrap();
        assert!(matches!(
            program.attribute("color"),
            Err(GlError::AttributeNotFound { .. })
        ));
        assert!(matches!(
            program.uniform("model"),
            Err(GlError::UniformNotFound { .. })
        ));
    }

    #[test]
    fn vertex_compile_failure_balances_objects() {
        let (recording, context) = setup();
        let descriptor = ProgramDescriptor::new("void main() { gl_Position = vec4(0.0);", FRAGMENT);
        let err = ShaderProgram::new(context, &descriptor).unwrap_err();
        assert!(matches!(
            err,
            GlError::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        let shaders = recording.counts(ObjectKind::Shader);
        assert_eq!(shaders.created, shaders.deleted);
        assert_eq!(recording.counts(ObjectKind::Program).created, 0);
    }

    #[test]
    fn fragment_compile_failure_releases_vertex_stage() {
        let (recording, context) = setup();
        let descriptor = ProgramDescriptor::new(VERTEX, "precision mediump float;");
        let err = ShaderProgram::new(context, &descriptor).unwrap_err();
        let GlError::ShaderCompile { stage, log } = err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(stage, ShaderStage::Fragment);
        assert!(log.contains("main"));
        assert_eq!(recording.counts(ObjectKind::Shader).created, 2);
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn link_failure_releases_everything() {
        let (recording, context) = setup();
        let fragment = "#version 300 es
precision mediump float;
in vec2 v_uv;
out vec4 fragColor;
void main() { fragColor = vec4(v_uv, 0.0, 1.0); }";
        let err = ShaderProgram::new(context, &ProgramDescriptor::new(VERTEX, fragment)).unwrap_err();
        let GlError::ProgramLink { log } = err else {
            panic!("unexpected error {err:?}");
        };
        assert!(log.contains("v_uv"));
        assert_eq!(recording.counts(ObjectKind::Program).deleted, 1);
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn allocation_failures_map_to_errors() {
        let (recording, context) = setup();
        recording.deny_allocations(ObjectKind::Program, 1);
        let err = ShaderProgram::new(context.clone(), &descriptor()).unwrap_err();
        assert_eq!(err, GlError::ProgramUnavailable);
        assert_eq!(recording.live_objects(), 0);

        recording.deny_allocations(ObjectKind::Buffer, 1);
        let err = ShaderProgram::new(context, &descriptor()).unwrap_err();
        assert_eq!(err, GlError::BufferAllocation);
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn dropping_program_releases_all_objects() {
        let (recording, context) = setup();
        let program = ShaderProgram::new(context, &descriptor()).unwrap();
        assert_eq!(recording.live_objects(), 5);
        drop(program);
        assert_eq!(recording.live_objects(), 0);
    }

    #[test]
    fn attribute_upload_and_pointer_reach_the_context() {
        let (recording, context) = setup();
        let mut program = ShaderProgram::new(context, &descriptor()).unwrap();
        program.use_program();
        let position = program.attribute("position").unwrap();
        position.bind_data(&[0.0, 1.0, 2.0]);
        position.vertex_attrib_pointer();
        let stored = recording.buffer_contents(position.buffer()).unwrap();
        assert_eq!(stored.len(), 12);
        let (pointer, buffer) = recording.vertex_source(position.location()).unwrap();
        assert_eq!(pointer.size, 3);
        assert_eq!(buffer, position.buffer());

        let normal = program.attribute_mut("normal").unwrap();
        let interleaved = VertexPointer {
            stride: 24,
            offset: 12,
            ..normal.pointer()
        };
        normal.vertex_attrib_pointer_with(interleaved);
        normal.vertex_attrib_pointer();
        let (pointer, _) = recording.vertex_source(normal.location()).unwrap();
        assert_eq!((pointer.stride, pointer.offset), (24, 12));
        assert_eq!(pointer.scalar, ScalarType::Float);
    }

    #[test]
    fn uniform_push_is_typed() {
        let (recording, context) = setup();
        let program = ShaderProgram::new(context, &descriptor()).unwrap();
        program.use_program();
        program.set_uniform("camera", Mat4::IDENTITY).unwrap();
        assert_eq!(recording.get_error(), constants::NO_ERROR);
        program.set_uniform("camera", Vec3::ONE).unwrap();
        assert_eq!(recording.get_error(), constants::INVALID_OPERATION);
    }

    #[test]
    fn small_matrix_uniforms_reach_the_draw() {
        let (recording, context) = setup();
        let vertex = "#version 300 es
in vec2 position;
uniform mat2 spin;
uniform mat3 frame;
void main() {
  vec3 p = frame * vec3(spin * position, 1.0);
  gl_Position = vec4(p.xy, 0.0, 1.0);
}";
        let fragment = "#version 300 es
precision mediump float;
out vec4 fragColor;
void main() {
  fragColor = vec4(1.0);
}";
        let descriptor = ProgramDescriptor::new(vertex, fragment)
            .attribute("position", VertexPointer::floats(2))
            .uniforms(["spin", "frame"]);
        let program = ShaderProgram::new(context.clone(), &descriptor).unwrap();
        program.use_program();

        let spin = Mat2::from_angle(0.5);
        let frame = Mat3::from_translation(Vec2::new(0.25, -0.5));
        program.set_uniform("spin", spin).unwrap();
        program.set_uniform("frame", frame).unwrap();
        assert_eq!(recording.get_error(), constants::NO_ERROR);

        context.draw_arrays(Primitive::Triangles, 0, 3);
        let draws = recording.draw_calls();
        let draw = draws.last().unwrap();
        assert_eq!(draw.uniform("spin"), Some(&UniformValue::Mat2(spin)));
        assert_eq!(draw.uniform("frame"), Some(&UniformValue::Mat3(frame)));

        program.set_uniform("frame", spin).unwrap();
        assert_eq!(recording.get_error(), constants::INVALID_OPERATION);
        program.set_uniform("spin", Mat3::IDENTITY).unwrap();
        assert_eq!(recording.get_error(), constants::INVALID_OPERATION);
    }
}
