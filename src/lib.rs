//! WebGL2 resource wrappers, matrix helpers and mesh generators, plus the
//! rendering captures built on top of them.
//!
//! The wrappers talk to a [`gl::GlContext`]. In the browser that is the real
//! WebGL2 context; everywhere else a [`gl::RecordingContext`] validates the
//! calls and records the draws, which keeps the captures testable headless.

pub mod app;
pub mod captures;
pub mod gl;
pub mod math;
pub mod model;
pub mod shapes;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use captures::{find_route, route_from_hash, Capture, CaptureOptions, Route, ROUTES};
pub use gl::{
    AttributeBinding, GlCanvas, GlError, GlResult, ImageSource, IndexBuffer, ProgramDescriptor,
    RecordingContext, ShaderProgram, Texture, UniformBinding,
};
pub use math::{MathError, Perspective};
pub use model::draw_model;
pub use shapes::Mesh;
