//! Thin, ownership-aware wrappers over a WebGL2 style context.
//!
//! Every wrapper holds a [`SharedContext`] and deletes the objects it created
//! when dropped. [`RecordingContext`] stands in for the browser in tests and
//! on the command line.

pub mod attribute;
pub mod buffer;
pub mod canvas;
pub mod context;
pub mod error;
pub mod glsl;
pub mod program;
pub mod recording;
pub mod texture;
pub mod uniform;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use attribute::AttributeBinding;
pub use buffer::{IndexBuffer, IndexElement};
pub use canvas::{GlCanvas, DEFAULT_CANVAS_SIZE};
pub use context::{
    AttribValue, BufferTarget, Capability, ClearMask, GlContext, IndexType, Primitive,
    ScalarType, ShaderStage, SharedContext, TextureParameter, UniformValue, VertexPointer,
};
pub use error::{GlError, GlResult};
pub use program::{ProgramDescriptor, ShaderProgram};
pub use recording::{DrawCall, ObjectCounts, ObjectKind, RecordingContext};
pub use texture::{ImageSource, Texture, MAX_TEXTURE_UNITS};
pub use uniform::UniformBinding;
#[cfg(target_arch = "wasm32")]
pub use web::WebGl2Context;
