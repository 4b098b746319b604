use glam::{Mat4, Vec3};
use gl_captures::gl::context::constants::{INVALID_OPERATION, NO_ERROR};
use gl_captures::gl::{
    Capability, ClearMask, DrawCall, GlCanvas, GlContext, GlError, IndexType, ObjectKind,
    Primitive, ProgramDescriptor, ShaderStage, UniformValue, VertexPointer,
};
use gl_captures::{math, shapes, CaptureOptions, ROUTES};

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

fn cube_descriptor() -> ProgramDescriptor {
    ProgramDescriptor::new(VERTEX, FRAGMENT)
        .attribute("position", VertexPointer::floats(3))
        .attribute("color", VertexPointer::floats(3))
        .uniform("camera")
}

#[test]
fn cube_mesh_draws_once_with_36_indices() {
    let (canvas, recording) = GlCanvas::headless(400, 400).expect("headless canvas");
    let program = canvas.create_program(&cube_descriptor()).expect("program");
    program.use_program();

    let mesh = shapes::cube();
    let position = program.attribute("position").expect("position");
    position.bind_data(&mesh.positions);
    position.vertex_attrib_pointer();
    let color = program.attribute("color").expect("color");
    color.bind_data(&mesh.normals);
    color.vertex_attrib_pointer();

    let camera = math::perspective(30.0, canvas.aspect(), 1.0, 100.0)
        * Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
    program.set_uniform("camera", camera).expect("camera");

    let mut indices = canvas.create_index_buffer().expect("index buffer");
    indices.upload(&mesh.indices);
    canvas.enable(Capability::DepthTest);
    canvas.clear(ClearMask::COLOR_AND_DEPTH);
    indices.draw(Primitive::Triangles);

    assert_eq!(recording.get_error(), NO_ERROR);
    let draws: Vec<DrawCall> = recording
        .draw_calls()
        .into_iter()
        .filter(DrawCall::is_draw)
        .collect();
    assert_eq!(draws.len(), 1);
    let DrawCall::Elements {
        mode,
        count,
        index_type,
        uniforms,
        ..
    } = &draws[0]
    else {
        panic!("expected an indexed draw, got {:?}", draws[0]);
    };
    assert_eq!(*mode, Primitive::Triangles);
    assert_eq!(*count, 36);
    assert_eq!(*index_type, IndexType::UnsignedShort);
    assert_eq!(uniforms.get("camera"), Some(&UniformValue::Mat4(camera)));
}

#[test]
fn invalid_shader_leaves_no_objects_behind() {
    let (canvas, recording) = GlCanvas::headless(400, 400).expect("headless canvas");
    let broken = ProgramDescriptor::new("void main() { gl_Position = vec4(1.0)", FRAGMENT);
    let err = canvas.create_program(&broken).unwrap_err();
    assert!(matches!(
        err,
        GlError::ShaderCompile {
            stage: ShaderStage::Vertex,
            ..
        }
    ));
    for kind in ObjectKind::ALL {
        let counts = recording.counts(kind);
        assert_eq!(counts.created, counts.deleted, "{}", kind.name());
    }
}

#[test]
fn missing_attribute_is_reported_by_name() {
    let (canvas, recording) = GlCanvas::headless(400, 400).expect("headless canvas");
    let descriptor = cube_descriptor().attribute("normal", VertexPointer::floats(3));
    let err = canvas.create_program(&descriptor).unwrap_err();
    assert_eq!(
        err,
        GlError::AttributeNotFound {
            name: "normal".into()
        }
    );
    assert_eq!(err.to_string(), "attribute 'normal' is not defined in the shader program");
    assert_eq!(recording.live_objects(), 0);
}

#[test]
fn present_attributes_have_non_negative_slots() {
    let (canvas, _recording) = GlCanvas::headless(400, 400).expect("headless canvas");
    let program = canvas.create_program(&cube_descriptor()).expect("program");
    let mut slots: Vec<u32> = program.attributes().map(|a| a.location()).collect();
    slots.sort_unstable();
    assert_eq!(slots, vec![0, 1]);
}

#[test]
fn uniform_from_a_program_not_in_use_is_rejected() {
    let (canvas, recording) = GlCanvas::headless(400, 400).expect("headless canvas");
    let first = canvas.create_program(&cube_descriptor()).expect("first");
    let second = canvas.create_program(&cube_descriptor()).expect("second");
    second.use_program();
    first.set_uniform("camera", Mat4::IDENTITY).expect("declared");
    assert_eq!(recording.get_error(), INVALID_OPERATION);
}

#[test]
fn every_route_starts_and_ticks_headless() {
    for route in ROUTES {
        let (canvas, recording) = GlCanvas::headless(400, 400).expect("headless canvas");
        let mut capture = route
            .start(&canvas, &CaptureOptions::default())
            .unwrap_or_else(|err| panic!("{} failed to start: {err:#}", route.name));
        if capture.interval().is_some() {
            capture.frame().expect("frame");
            capture.frame().expect("frame");
        }
        assert_eq!(recording.get_error(), NO_ERROR, "{}", route.name);
        assert!(
            recording.draw_calls().iter().any(DrawCall::is_draw),
            "{} drew nothing",
            route.name
        );
        drop(capture);
        drop(canvas);
        assert_eq!(recording.live_objects(), 0, "{} leaked objects", route.name);
    }
}
