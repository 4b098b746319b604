//! The seam between the resource wrappers and a concrete graphics API.
//!
//! [`GlContext`] mirrors the subset of the WebGL2 entry points the wrappers
//! need. Object handles are plain ids; the implementation maps them to
//! whatever the backing API hands out.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// GL enum values used across the crate (OpenGL ES 3.0 numbering).
pub mod constants {
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;

    pub const COLOR_BUFFER_BIT: u32 = 0x0000_4000;
    pub const DEPTH_BUFFER_BIT: u32 = 0x0000_0100;

    pub const POINTS: u32 = 0x0000;
    pub const LINES: u32 = 0x0001;
    pub const LINE_LOOP: u32 = 0x0002;
    pub const LINE_STRIP: u32 = 0x0003;
    pub const TRIANGLES: u32 = 0x0004;
    pub const TRIANGLE_STRIP: u32 = 0x0005;
    pub const TRIANGLE_FAN: u32 = 0x0006;

    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const STATIC_DRAW: u32 = 0x88E4;

    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;

    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const FRAGMENT_SHADER: u32 = 0x8B30;

    pub const DEPTH_TEST: u32 = 0x0B71;
    pub const CULL_FACE: u32 = 0x0B44;
    pub const BLEND: u32 = 0x0BE2;

    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE0: u32 = 0x84C0;
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const REPEAT: u32 = 0x2901;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const RGBA: u32 = 0x1908;
}

use constants::*;

static NEXT_OBJECT_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque handle to an object owned by a [`GlContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlObject(pub u32);

impl GlObject {
    pub fn new() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl Default for GlObject {
    fn default() -> Self {
        Self::new()
    }
}

pub type ShaderHandle = GlObject;
pub type ProgramHandle = GlObject;
pub type BufferHandle = GlObject;
pub type TextureHandle = GlObject;
pub type UniformLocation = GlObject;

/// Context shared by every wrapper created from one canvas.
pub type SharedContext = Arc<dyn GlContext>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => VERTEX_SHADER,
            ShaderStage::Fragment => FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => ARRAY_BUFFER,
            BufferTarget::ElementArray => ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Primitive {
    pub fn gl_enum(self) -> u32 {
        match self {
            Primitive::Points => POINTS,
            Primitive::Lines => LINES,
            Primitive::LineLoop => LINE_LOOP,
            Primitive::LineStrip => LINE_STRIP,
            Primitive::Triangles => TRIANGLES,
            Primitive::TriangleStrip => TRIANGLE_STRIP,
            Primitive::TriangleFan => TRIANGLE_FAN,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Points => "points",
            Primitive::Lines => "lines",
            Primitive::LineLoop => "line-loop",
            Primitive::LineStrip => "line-strip",
            Primitive::Triangles => "triangles",
            Primitive::TriangleStrip => "triangle-strip",
            Primitive::TriangleFan => "triangle-fan",
        }
    }
}

/// Component type of a vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Float,
}

impl ScalarType {
    pub fn gl_enum(self) -> u32 {
        match self {
            ScalarType::Byte => BYTE,
            ScalarType::UnsignedByte => UNSIGNED_BYTE,
            ScalarType::Short => SHORT,
            ScalarType::UnsignedShort => UNSIGNED_SHORT,
            ScalarType::Float => FLOAT,
        }
    }

    pub fn size_in_bytes(self) -> i32 {
        match self {
            ScalarType::Byte | ScalarType::UnsignedByte => 1,
            ScalarType::Short | ScalarType::UnsignedShort => 2,
            ScalarType::Float => 4,
        }
    }
}

/// Element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn gl_enum(self) -> u32 {
        match self {
            IndexType::UnsignedByte => UNSIGNED_BYTE,
            IndexType::UnsignedShort => UNSIGNED_SHORT,
            IndexType::UnsignedInt => UNSIGNED_INT,
        }
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexType::UnsignedByte => "u8",
            IndexType::UnsignedShort => "u16",
            IndexType::UnsignedInt => "u32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    DepthTest,
    CullFace,
    Blend,
}

impl Capability {
    pub fn gl_enum(self) -> u32 {
        match self {
            Capability::DepthTest => DEPTH_TEST,
            Capability::CullFace => CULL_FACE,
            Capability::Blend => BLEND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureParameter {
    WrapS,
    WrapT,
    MinFilter,
    MagFilter,
}

impl TextureParameter {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureParameter::WrapS => TEXTURE_WRAP_S,
            TextureParameter::WrapT => TEXTURE_WRAP_T,
            TextureParameter::MinFilter => TEXTURE_MIN_FILTER,
            TextureParameter::MagFilter => TEXTURE_MAG_FILTER,
        }
    }
}

/// Buffers cleared by [`GlContext::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };
    pub const COLOR_AND_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };

    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.color {
            bits |= COLOR_BUFFER_BIT;
        }
        if self.depth {
            bits |= DEPTH_BUFFER_BIT;
        }
        bits
    }
}

/// Layout of one attribute inside its array buffer. Stride and offset are in
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexPointer {
    pub size: i32,
    pub scalar: ScalarType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

impl Default for VertexPointer {
    fn default() -> Self {
        Self {
            size: 2,
            scalar: ScalarType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

impl VertexPointer {
    /// Tightly packed float components, `size` per vertex.
    pub fn floats(size: i32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_stride(mut self, stride: i32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

/// Constant value for an attribute slot with no array enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttribValue {
    F1(f32),
    F2(Vec2),
    F3(Vec3),
    F4(Vec4),
}

/// A value pushed to a uniform. The variant selects the upload entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    /// Packed array of `components`-wide float vectors (`uniform{N}fv`).
    FloatArray { components: u8, values: Vec<f32> },
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// GLSL type a declaration must have to accept this value. `Int` also
    /// feeds `bool` and sampler uniforms.
    pub fn glsl_type(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Int(_) => "int",
            UniformValue::FloatArray { components, .. } => match components {
                1 => "float",
                2 => "vec2",
                3 => "vec3",
                _ => "vec4",
            },
            UniformValue::Mat2(_) => "mat2",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat2> for UniformValue {
    fn from(value: Mat2) -> Self {
        UniformValue::Mat2(value)
    }
}

impl From<Mat3> for UniformValue {
    fn from(value: Mat3) -> Self {
        UniformValue::Mat3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

/// Graphics API surface driven by the program, attribute, uniform and
/// texture wrappers. Methods take `&self`; implementations keep their own
/// interior state the way a GL context does.
pub trait GlContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle>;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> Option<ProgramHandle>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn delete_program(&self, program: ProgramHandle);

    /// Slot of a linked attribute, `-1` when the program has no such input.
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> i32;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn create_buffer(&self) -> Option<BufferHandle>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Replaces the contents of the buffer bound to `target` (STATIC_DRAW).
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferHandle);

    fn enable_vertex_attrib_array(&self, location: u32);
    /// Sources `location` from the buffer currently bound to ARRAY_BUFFER.
    fn vertex_attrib_pointer(&self, location: u32, pointer: &VertexPointer);
    fn vertex_attrib(&self, location: u32, value: AttribValue);
    fn uniform(&self, location: UniformLocation, value: &UniformValue);

    fn create_texture(&self) -> Option<TextureHandle>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<TextureHandle>);
    fn tex_parameter(&self, parameter: TextureParameter, value: u32);
    fn pixel_store_flip_y(&self, flip: bool);
    /// Uploads tightly packed RGBA8 rows to level 0 of the bound 2D texture.
    fn tex_image_2d(&self, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: TextureHandle);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, color: Vec4);
    fn enable(&self, capability: Capability);
    fn clear(&self, mask: ClearMask);
    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32);
    /// `offset` is a byte offset into the bound element buffer.
    fn draw_elements(&self, mode: Primitive, count: i32, index_type: IndexType, offset: i32);

    /// Returns and resets the oldest recorded error (`NO_ERROR` when none).
    fn get_error(&self) -> u32;
}
