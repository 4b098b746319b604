//! Drawing one model instance with the lighting uniforms the shaded
//! captures share.

use glam::Mat4;

use crate::gl::{GlResult, IndexBuffer, Primitive, ShaderProgram};
use crate::math;

/// Uploads `model`, `mvp = camera * model` and `inverseTranspose`, then draws
/// every index in `indices` as triangles. The program must be in use.
pub fn draw_model(
    program: &ShaderProgram,
    camera: &Mat4,
    model: &Mat4,
    indices: &IndexBuffer,
) -> GlResult<()> {
    program.set_uniform("model", *model)?;
    program.set_uniform("mvp", *camera * *model)?;
    program.set_uniform("inverseTranspose", math::normal_matrix(model))?;
    indices.draw(Primitive::Triangles);
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::gl::{GlCanvas, GlError, ProgramDescriptor, UniformValue, VertexPointer};
    use crate::shapes;

    const VERTEX: &str = "#version 300 es
in vec4 position;
in vec4 normal;
uniform mat4 model;
uniform mat4 mvp;
uniform mat4 inverseTranspose;
out vec3 v_normal;
void main() {
  gl_Position = mvp * position;
  v_normal = normalize(vec3(inverseTranspose * normal));
}";

    const FRAGMENT: &str = "#version 300 es
precision mediump float;
in vec3 v_normal;
out vec4 fragColor;
void main() {
  fragColor = vec4(abs(v_normal), 1.0);
}";

    #[test]
    fn uploads_matrices_and_draws_indices() {
        let (canvas, recording) = GlCanvas::headless(4, 4).unwrap();
        let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
            .attribute("position", VertexPointer::floats(3))
            .attribute("normal", VertexPointer::floats(3))
            .uniforms(["model", "mvp", "inverseTranspose"]);
        let program = canvas.create_program(&descriptor).unwrap();
        program.use_program();

        let mesh = shapes::cube();
        for (name, data) in [("position", &mesh.positions), ("normal", &mesh.normals)] {
            let attribute = program.attribute(name).unwrap();
            attribute.bind_data(data);
            attribute.vertex_attrib_pointer();
        }
        let mut indices = canvas.create_index_buffer().unwrap();
        indices.upload(&mesh.indices);

        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let model = Mat4::from_scale(Vec3::new(1.0, 2.0, 1.0));
        draw_model(&program, &camera, &model, &indices).unwrap();

        let draws = recording.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].describe(), "triangles count=36 indexed(u16)");
        assert_eq!(
            draws[0].uniform("mvp"),
            Some(&UniformValue::Mat4(camera * model))
        );
        let Some(UniformValue::Mat4(normal)) = draws[0].uniform("inverseTranspose") else {
            panic!("inverseTranspose was not uploaded");
        };
        assert!(normal.abs_diff_eq(Mat4::from_scale(Vec3::new(1.0, 0.5, 1.0)), 1e-6));
    }

    #[test]
    fn requires_the_matrix_uniforms() {
        let (canvas, _recording) = GlCanvas::headless(4, 4).unwrap();
        let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
            .attribute("position", VertexPointer::floats(3))
            .uniform("mvp");
        let program = canvas.create_program(&descriptor).unwrap();
        let indices = canvas.create_index_buffer().unwrap();
        let err = draw_model(&program, &Mat4::IDENTITY, &Mat4::IDENTITY, &indices).unwrap_err();
        assert_eq!(err, GlError::UniformNotFound { name: "model".into() });
    }
}
