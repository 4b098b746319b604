//! [`GlContext`] over a browser `WebGL2RenderingContext`.

use std::cell::RefCell;
use std::collections::HashMap;

use glam::Vec4;
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation,
};

use super::context::{
    AttribValue, BufferHandle, BufferTarget, Capability, ClearMask, GlContext, GlObject,
    IndexType, Primitive, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
    TextureParameter, UniformLocation, UniformValue, VertexPointer,
};
use super::error::{GlError, GlResult};

#[derive(Default)]
struct Objects {
    shaders: HashMap<ShaderHandle, WebGlShader>,
    programs: HashMap<ProgramHandle, WebGlProgram>,
    buffers: HashMap<BufferHandle, WebGlBuffer>,
    textures: HashMap<TextureHandle, WebGlTexture>,
    uniforms: HashMap<UniformLocation, WebGlUniformLocation>,
}

/// Browser context. Handles are mapped to the JS objects WebGL hands out.
pub struct WebGl2Context {
    gl: Gl,
    objects: RefCell<Objects>,
}

impl WebGl2Context {
    pub fn new(gl: Gl) -> Self {
        Self {
            gl,
            objects: RefCell::new(Objects::default()),
        }
    }

    /// Requests a `webgl2` context from `canvas`.
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> GlResult<Self> {
        let context = canvas
            .get_context("webgl2")
            .map_err(|err| GlError::ContextUnavailable(format!("{err:?}")))?
            .ok_or_else(|| GlError::ContextUnavailable("webgl2 is not supported".into()))?
            .dyn_into::<Gl>()
            .map_err(|_| GlError::ContextUnavailable("unexpected context type".into()))?;
        Ok(Self::new(context))
    }

    fn shader(&self, shader: ShaderHandle) -> Option<WebGlShader> {
        self.objects.borrow().shaders.get(&shader).cloned()
    }

    fn program(&self, program: ProgramHandle) -> Option<WebGlProgram> {
        self.objects.borrow().programs.get(&program).cloned()
    }

    fn buffer(&self, buffer: BufferHandle) -> Option<WebGlBuffer> {
        self.objects.borrow().buffers.get(&buffer).cloned()
    }

    fn texture(&self, texture: TextureHandle) -> Option<WebGlTexture> {
        self.objects.borrow().textures.get(&texture).cloned()
    }
}

impl GlContext for WebGl2Context {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let shader = self.gl.create_shader(stage.gl_enum())?;
        let handle = GlObject::new();
        self.objects.borrow_mut().shaders.insert(handle, shader);
        Some(handle)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        if let Some(shader) = self.shader(shader) {
            self.gl.shader_source(&shader, source);
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        if let Some(shader) = self.shader(shader) {
            self.gl.compile_shader(&shader);
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.shader(shader).is_some_and(|shader| {
            self.gl
                .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
                .as_bool()
                .unwrap_or(false)
        })
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.shader(shader)
            .and_then(|shader| self.gl.get_shader_info_log(&shader))
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let removed = self.objects.borrow_mut().shaders.remove(&shader);
        if let Some(shader) = removed {
            self.gl.delete_shader(Some(&shader));
        }
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let program = self.gl.create_program()?;
        let handle = GlObject::new();
        self.objects.borrow_mut().programs.insert(handle, program);
        Some(handle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        if let (Some(program), Some(shader)) = (self.program(program), self.shader(shader)) {
            self.gl.attach_shader(&program, &shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        if let Some(program) = self.program(program) {
            self.gl.link_program(&program);
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.program(program).is_some_and(|program| {
            self.gl
                .get_program_parameter(&program, Gl::LINK_STATUS)
                .as_bool()
                .unwrap_or(false)
        })
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.program(program)
            .and_then(|program| self.gl.get_program_info_log(&program))
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let program = program.and_then(|handle| self.program(handle));
        self.gl.use_program(program.as_ref());
    }

    fn delete_program(&self, program: ProgramHandle) {
        let removed = self.objects.borrow_mut().programs.remove(&program);
        if let Some(program) = removed {
            self.gl.delete_program(Some(&program));
        }
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> i32 {
        self.program(program)
            .map_or(-1, |program| self.gl.get_attrib_location(&program, name))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = self.program(program)?;
        let location = self.gl.get_uniform_location(&program, name)?;
        let handle = GlObject::new();
        self.objects.borrow_mut().uniforms.insert(handle, location);
        Some(handle)
    }

    fn create_buffer(&self) -> Option<BufferHandle> {
        let buffer = self.gl.create_buffer()?;
        let handle = GlObject::new();
        self.objects.borrow_mut().buffers.insert(handle, buffer);
        Some(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let buffer = buffer.and_then(|handle| self.buffer(handle));
        self.gl.bind_buffer(target.gl_enum(), buffer.as_ref());
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        self.gl
            .buffer_data_with_u8_array(target.gl_enum(), data, Gl::STATIC_DRAW);
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let removed = self.objects.borrow_mut().buffers.remove(&buffer);
        if let Some(buffer) = removed {
            self.gl.delete_buffer(Some(&buffer));
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.gl.enable_vertex_attrib_array(location);
    }

    fn vertex_attrib_pointer(&self, location: u32, pointer: &VertexPointer) {
        self.gl.vertex_attrib_pointer_with_i32(
            location,
            pointer.size,
            pointer.scalar.gl_enum(),
            pointer.normalized,
            pointer.stride,
            pointer.offset,
        );
    }

    fn vertex_attrib(&self, location: u32, value: AttribValue) {
        match value {
            AttribValue::F1(x) => self.gl.vertex_attrib1f(location, x),
            AttribValue::F2(v) => self.gl.vertex_attrib2f(location, v.x, v.y),
            AttribValue::F3(v) => self.gl.vertex_attrib3f(location, v.x, v.y, v.z),
            AttribValue::F4(v) => self.gl.vertex_attrib4f(location, v.x, v.y, v.z, v.w),
        }
    }

    fn uniform(&self, location: UniformLocation, value: &UniformValue) {
        let objects = self.objects.borrow();
        let Some(location) = objects.uniforms.get(&location) else {
            warn!("uniform location {} is unknown", location.id());
            return;
        };
        let location = Some(location);
        match value {
            UniformValue::Float(x) => self.gl.uniform1f(location, *x),
            UniformValue::Vec2(v) => self.gl.uniform2f(location, v.x, v.y),
            UniformValue::Vec3(v) => self.gl.uniform3f(location, v.x, v.y, v.z),
            UniformValue::Vec4(v) => self.gl.uniform4f(location, v.x, v.y, v.z, v.w),
            UniformValue::Int(i) => self.gl.uniform1i(location, *i),
            UniformValue::FloatArray { components, values } => match components {
                1 => self.gl.uniform1fv_with_f32_array(location, values),
                2 => self.gl.uniform2fv_with_f32_array(location, values),
                3 => self.gl.uniform3fv_with_f32_array(location, values),
                _ => self.gl.uniform4fv_with_f32_array(location, values),
            },
            UniformValue::Mat2(m) => {
                self.gl
                    .uniform_matrix2fv_with_f32_array(location, false, &m.to_cols_array())
            }
            UniformValue::Mat3(m) => {
                self.gl
                    .uniform_matrix3fv_with_f32_array(location, false, &m.to_cols_array())
            }
            UniformValue::Mat4(m) => {
                self.gl
                    .uniform_matrix4fv_with_f32_array(location, false, &m.to_cols_array())
            }
        }
    }

    fn create_texture(&self) -> Option<TextureHandle> {
        let texture = self.gl.create_texture()?;
        let handle = GlObject::new();
        self.objects.borrow_mut().textures.insert(handle, texture);
        Some(handle)
    }

    fn active_texture(&self, unit: u32) {
        self.gl.active_texture(Gl::TEXTURE0 + unit);
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        let texture = texture.and_then(|handle| self.texture(handle));
        self.gl.bind_texture(Gl::TEXTURE_2D, texture.as_ref());
    }

    fn tex_parameter(&self, parameter: TextureParameter, value: u32) {
        self.gl
            .tex_parameteri(Gl::TEXTURE_2D, parameter.gl_enum(), value as i32);
    }

    fn pixel_store_flip_y(&self, flip: bool) {
        self.gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, i32::from(flip));
    }

    fn tex_image_2d(&self, width: u32, height: u32, pixels: &[u8]) {
        let result = self
            .gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                width as i32,
                height as i32,
                0,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                Some(pixels),
            );
        if let Err(err) = result {
            warn!("texImage2D failed: {err:?}");
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let removed = self.objects.borrow_mut().textures.remove(&texture);
        if let Some(texture) = removed {
            self.gl.delete_texture(Some(&texture));
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    fn clear_color(&self, color: Vec4) {
        self.gl.clear_color(color.x, color.y, color.z, color.w);
    }

    fn enable(&self, capability: Capability) {
        self.gl.enable(capability.gl_enum());
    }

    fn clear(&self, mask: ClearMask) {
        self.gl.clear(mask.bits());
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        self.gl.draw_arrays(mode.gl_enum(), first, count);
    }

    fn draw_elements(&self, mode: Primitive, count: i32, index_type: IndexType, offset: i32) {
        self.gl
            .draw_elements_with_i32(mode.gl_enum(), count, index_type.gl_enum(), offset);
    }

    fn get_error(&self) -> u32 {
        self.gl.get_error()
    }
}
