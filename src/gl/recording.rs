//! Headless [`GlContext`] that validates calls the way a WebGL2 driver would
//! and records what was drawn.
//!
//! Used by the tests and by the command line runner. Nothing is rasterised;
//! each draw is stored as a [`DrawCall`] together with the uniform values the
//! current program held at that moment.

use std::collections::{BTreeMap, HashMap, HashSet};

use glam::Vec4;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::context::constants::*;
use super::context::{
    AttribValue, BufferHandle, BufferTarget, Capability, ClearMask, GlContext, GlObject,
    IndexType, Primitive, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
    TextureParameter, UniformLocation, UniformValue, VertexPointer,
};
use super::error::GlError;
use super::glsl::{self, Declaration, ShaderInterface, MAX_VERTEX_ATTRIBS};
use super::texture::MAX_TEXTURE_UNITS;

/// Kinds of context objects tracked by [`RecordingContext::counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Shader,
    Program,
    Buffer,
    Texture,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Shader,
        ObjectKind::Program,
        ObjectKind::Buffer,
        ObjectKind::Texture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Shader => "shaders",
            ObjectKind::Program => "programs",
            ObjectKind::Buffer => "buffers",
            ObjectKind::Texture => "textures",
        }
    }
}

/// Creation and deletion totals for one object kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub created: u32,
    pub deleted: u32,
}

impl ObjectCounts {
    pub fn live(&self) -> u32 {
        self.created - self.deleted
    }
}

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCall {
    Clear {
        mask: ClearMask,
        color: Vec4,
    },
    Arrays {
        mode: Primitive,
        first: i32,
        count: i32,
        program: ProgramHandle,
        uniforms: BTreeMap<String, UniformValue>,
    },
    Elements {
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: i32,
        program: ProgramHandle,
        uniforms: BTreeMap<String, UniformValue>,
    },
}

impl DrawCall {
    pub fn is_draw(&self) -> bool {
        !matches!(self, DrawCall::Clear { .. })
    }

    pub fn mode(&self) -> Option<Primitive> {
        match self {
            DrawCall::Clear { .. } => None,
            DrawCall::Arrays { mode, .. } | DrawCall::Elements { mode, .. } => Some(*mode),
        }
    }

    pub fn count(&self) -> i32 {
        match self {
            DrawCall::Clear { .. } => 0,
            DrawCall::Arrays { count, .. } | DrawCall::Elements { count, .. } => *count,
        }
    }

    /// Value the named uniform held when the draw was issued.
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        match self {
            DrawCall::Clear { .. } => None,
            DrawCall::Arrays { uniforms, .. } | DrawCall::Elements { uniforms, .. } => {
                uniforms.get(name)
            }
        }
    }

    /// One line summary, e.g. `triangles count=36 indexed(u16)`.
    pub fn describe(&self) -> String {
        match self {
            DrawCall::Clear { mask, .. } => {
                let mut parts = Vec::new();
                if mask.color {
                    parts.push("color");
                }
                if mask.depth {
                    parts.push("depth");
                }
                format!("clear {}", parts.join("+"))
            }
            DrawCall::Arrays {
                mode, first, count, ..
            } => format!("{} first={first} count={count}", mode.name()),
            DrawCall::Elements {
                mode,
                count,
                index_type,
                ..
            } => format!("{} count={count} indexed({})", mode.name(), index_type.name()),
        }
    }
}

/// Snapshot of a texture's level 0 image and sampling parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedTexture {
    pub width: u32,
    pub height: u32,
    /// RGBA8 rows in storage order (bottom row first when uploaded flipped).
    pub pixels: Vec<u8>,
    pub parameters: HashMap<TextureParameter, u32>,
}

#[derive(Debug)]
struct ShaderData {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
    interface: ShaderInterface,
}

#[derive(Debug)]
struct UniformSlot {
    declaration: Declaration,
    location: UniformLocation,
    value: Option<UniformValue>,
}

#[derive(Debug, Default)]
struct ProgramData {
    attached: Vec<ShaderHandle>,
    linked: bool,
    info_log: String,
    attributes: HashMap<String, u32>,
    uniforms: BTreeMap<String, UniformSlot>,
}

#[derive(Debug, Clone, Copy, Default)]
struct VertexSlot {
    enabled: bool,
    source: Option<(VertexPointer, BufferHandle)>,
    constant: Option<AttribValue>,
}

#[derive(Debug)]
struct State {
    width: u32,
    height: u32,
    viewport: [i32; 4],
    clear_color: Vec4,
    capabilities: HashSet<Capability>,
    shaders: HashMap<ShaderHandle, ShaderData>,
    programs: HashMap<ProgramHandle, ProgramData>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, RecordedTexture>,
    uniform_locations: HashMap<UniformLocation, (ProgramHandle, String)>,
    current_program: Option<ProgramHandle>,
    array_buffer: Option<BufferHandle>,
    element_buffer: Option<BufferHandle>,
    vertex_slots: [VertexSlot; MAX_VERTEX_ATTRIBS as usize],
    active_unit: u32,
    texture_units: HashMap<u32, TextureHandle>,
    flip_y: bool,
    draws: Vec<DrawCall>,
    error: u32,
    counts: HashMap<ObjectKind, ObjectCounts>,
    denied: HashMap<ObjectKind, u32>,
}

impl State {
    fn record_error(&mut self, code: u32, what: &str) {
        debug!("GL error 0x{code:04X}: {what}");
        if self.error == NO_ERROR {
            self.error = code;
        }
    }

    fn allocate(&mut self, kind: ObjectKind) -> Option<GlObject> {
        if let Some(remaining) = self.denied.get_mut(&kind) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!("refusing {} allocation", kind.name());
                return None;
            }
        }
        self.counts.entry(kind).or_default().created += 1;
        Some(GlObject::new())
    }

    fn released(&mut self, kind: ObjectKind) {
        self.counts.entry(kind).or_default().deleted += 1;
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self.element_buffer,
        }
    }

    fn bound_texture(&self) -> Option<TextureHandle> {
        self.texture_units.get(&self.active_unit).copied()
    }

    fn attached_interface(
        &self,
        attached: &[ShaderHandle],
        stage: ShaderStage,
    ) -> Result<&ShaderInterface, String> {
        let shader = attached
            .iter()
            .filter_map(|handle| self.shaders.get(handle))
            .find(|s| s.stage == stage)
            .ok_or_else(|| format!("ERROR: no {stage} shader attached"))?;
        if !shader.compiled {
            return Err(format!("ERROR: {stage} shader is not compiled"));
        }
        Ok(&shader.interface)
    }

    /// Program that a draw would run, if it is usable.
    fn draw_program(&mut self) -> Option<ProgramHandle> {
        let Some(program) = self.current_program else {
            self.record_error(INVALID_OPERATION, "draw without a current program");
            return None;
        };
        if !self.programs.get(&program).is_some_and(|p| p.linked) {
            self.record_error(INVALID_OPERATION, "draw with an unlinked program");
            return None;
        }
        Some(program)
    }

    /// Checks that every enabled array feeding `program` holds `vertices`.
    fn check_vertex_sources(&mut self, program: ProgramHandle, vertices: usize) -> bool {
        if vertices == 0 {
            return true;
        }
        let locations: Vec<u32> = self
            .programs
            .get(&program)
            .map(|p| p.attributes.values().copied().collect())
            .unwrap_or_default();
        for location in locations {
            let slot = self.vertex_slots[location as usize];
            if !slot.enabled {
                continue;
            }
            let Some((pointer, buffer)) = slot.source else {
                self.record_error(INVALID_OPERATION, "enabled attribute has no buffer");
                return false;
            };
            let Some(len) = self.buffers.get(&buffer).map(Vec::len) else {
                self.record_error(INVALID_OPERATION, "attribute buffer was deleted");
                return false;
            };
            let element = (pointer.size * pointer.scalar.size_in_bytes()) as usize;
            let stride = if pointer.stride == 0 {
                element
            } else {
                pointer.stride as usize
            };
            let needed = (vertices - 1)
                .saturating_mul(stride)
                .saturating_add(pointer.offset as usize + element);
            if needed > len {
                self.record_error(
                    INVALID_OPERATION,
                    &format!("attribute {location} needs {needed} bytes, buffer has {len}"),
                );
                return false;
            }
        }
        true
    }

    fn uniform_snapshot(&self, program: ProgramHandle) -> BTreeMap<String, UniformValue> {
        self.programs
            .get(&program)
            .map(|p| {
                p.uniforms
                    .iter()
                    .filter_map(|(name, slot)| slot.value.clone().map(|v| (name.clone(), v)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// In-memory WebGL2 stand-in.
#[derive(Debug)]
pub struct RecordingContext {
    state: Mutex<State>,
}

impl RecordingContext {
    /// Creates a context for a drawing surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, GlError> {
        if width == 0 || height == 0 {
            return Err(GlError::ContextUnavailable(format!(
                "canvas has zero area ({width}x{height})"
            )));
        }
        Ok(Self {
            state: Mutex::new(State {
                width,
                height,
                viewport: [0, 0, width as i32, height as i32],
                clear_color: Vec4::ZERO,
                capabilities: HashSet::new(),
                shaders: HashMap::new(),
                programs: HashMap::new(),
                buffers: HashMap::new(),
                textures: HashMap::new(),
                uniform_locations: HashMap::new(),
                current_program: None,
                array_buffer: None,
                element_buffer: None,
                vertex_slots: [VertexSlot::default(); MAX_VERTEX_ATTRIBS as usize],
                active_unit: 0,
                texture_units: HashMap::new(),
                flip_y: false,
                draws: Vec::new(),
                error: NO_ERROR,
                counts: HashMap::new(),
                denied: HashMap::new(),
            }),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.width, state.height)
    }

    /// Everything recorded so far, clears included.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.lock().draws.clone()
    }

    pub fn take_draw_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.state.lock().draws)
    }

    pub fn counts(&self, kind: ObjectKind) -> ObjectCounts {
        self.state
            .lock()
            .counts
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Objects created and not yet deleted, across all kinds.
    pub fn live_objects(&self) -> u32 {
        self.state.lock().counts.values().map(ObjectCounts::live).sum()
    }

    /// Makes the next `count` creations of `kind` fail as if the driver were
    /// out of objects.
    pub fn deny_allocations(&self, kind: ObjectKind, count: u32) {
        self.state.lock().denied.insert(kind, count);
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.lock().capabilities.contains(&capability)
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.lock().viewport
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.lock().current_program
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<RecordedTexture> {
        self.state.lock().textures.get(&texture).cloned()
    }

    pub fn texture_unit(&self, unit: u32) -> Option<TextureHandle> {
        self.state.lock().texture_units.get(&unit).copied()
    }

    /// Pointer layout and buffer feeding an attribute slot, when enabled.
    pub fn vertex_source(&self, location: u32) -> Option<(VertexPointer, BufferHandle)> {
        let state = self.state.lock();
        let slot = state.vertex_slots.get(location as usize)?;
        if slot.enabled {
            slot.source
        } else {
            None
        }
    }

    pub fn attribute_constant(&self, location: u32) -> Option<AttribValue> {
        let state = self.state.lock();
        state.vertex_slots.get(location as usize)?.constant
    }
}

impl GlContext for RecordingContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let mut state = self.state.lock();
        let shader = state.allocate(ObjectKind::Shader)?;
        state.shaders.insert(
            shader,
            ShaderData {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
                interface: ShaderInterface::default(),
            },
        );
        Some(shader)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut state = self.state.lock();
        match state.shaders.get_mut(&shader) {
            Some(data) => data.source = source.to_string(),
            None => state.record_error(INVALID_VALUE, "shader_source on unknown shader"),
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        let Some(data) = state.shaders.get_mut(&shader) else {
            state.record_error(INVALID_VALUE, "compile_shader on unknown shader");
            return;
        };
        match glsl::compile(data.stage, &data.source) {
            Ok(interface) => {
                data.compiled = true;
                data.info_log.clear();
                data.interface = interface;
            }
            Err(log) => {
                debug!("{} shader failed to compile: {log}", data.stage);
                data.compiled = false;
                data.info_log = log;
                data.interface = ShaderInterface::default();
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .lock()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .lock()
            .shaders
            .get(&shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if state.shaders.remove(&shader).is_some() {
            state.released(ObjectKind::Shader);
        }
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        let mut state = self.state.lock();
        let program = state.allocate(ObjectKind::Program)?;
        state.programs.insert(program, ProgramData::default());
        Some(program)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.lock();
        let Some(stage) = state.shaders.get(&shader).map(|s| s.stage) else {
            state.record_error(INVALID_VALUE, "attach_shader with unknown shader");
            return;
        };
        let already = {
            let Some(data) = state.programs.get(&program) else {
                state.record_error(INVALID_VALUE, "attach_shader on unknown program");
                return;
            };
            data.attached.iter().any(|attached| {
                *attached == shader
                    || state.shaders.get(attached).is_some_and(|s| s.stage == stage)
            })
        };
        if already {
            state.record_error(INVALID_OPERATION, "program already has a shader of that stage");
            return;
        }
        if let Some(data) = state.programs.get_mut(&program) {
            data.attached.push(shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        let Some(data) = state.programs.get(&program) else {
            state.record_error(INVALID_VALUE, "link_program on unknown program");
            return;
        };
        let linked = state
            .attached_interface(&data.attached, ShaderStage::Vertex)
            .and_then(|vertex| {
                let fragment = state.attached_interface(&data.attached, ShaderStage::Fragment)?;
                glsl::link(vertex, fragment)
            });

        let stale: Vec<UniformLocation> = data.uniforms.values().map(|u| u.location).collect();
        for location in stale {
            state.uniform_locations.remove(&location);
        }

        match linked {
            Ok(interface) => {
                let mut uniforms = BTreeMap::new();
                for declaration in interface.uniforms {
                    let location = GlObject::new();
                    state
                        .uniform_locations
                        .insert(location, (program, declaration.name.clone()));
                    uniforms.insert(
                        declaration.name.clone(),
                        UniformSlot {
                            declaration,
                            location,
                            value: None,
                        },
                    );
                }
                if let Some(data) = state.programs.get_mut(&program) {
                    data.linked = true;
                    data.info_log.clear();
                    data.attributes = interface.attributes;
                    data.uniforms = uniforms;
                }
            }
            Err(log) => {
                debug!("program failed to link: {log}");
                if let Some(data) = state.programs.get_mut(&program) {
                    data.linked = false;
                    data.info_log = log;
                    data.attributes.clear();
                    data.uniforms.clear();
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .lock()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .lock()
            .programs
            .get(&program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.lock();
        if let Some(handle) = program {
            if !state.programs.get(&handle).is_some_and(|p| p.linked) {
                state.record_error(INVALID_OPERATION, "use_program with an unlinked program");
                return;
            }
        }
        state.current_program = program;
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        let Some(data) = state.programs.remove(&program) else {
            return;
        };
        for slot in data.uniforms.values() {
            state.uniform_locations.remove(&slot.location);
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.released(ObjectKind::Program);
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> i32 {
        let mut state = self.state.lock();
        let Some(data) = state.programs.get(&program) else {
            state.record_error(INVALID_VALUE, "attrib_location on unknown program");
            return -1;
        };
        if !data.linked {
            state.record_error(INVALID_OPERATION, "attrib_location on unlinked program");
            return -1;
        }
        data.attributes
            .get(name)
            .map(|location| *location as i32)
            .unwrap_or(-1)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.lock();
        let data = state.programs.get(&program).filter(|p| p.linked)?;
        let name = name.strip_suffix("[0]").unwrap_or(name);
        data.uniforms.get(name).map(|slot| slot.location)
    }

    fn create_buffer(&self) -> Option<BufferHandle> {
        let mut state = self.state.lock();
        let buffer = state.allocate(ObjectKind::Buffer)?;
        state.buffers.insert(buffer, Vec::new());
        Some(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state.lock();
        if let Some(handle) = buffer {
            if !state.buffers.contains_key(&handle) {
                state.record_error(INVALID_OPERATION, "bind_buffer with a deleted buffer");
                return;
            }
        }
        match target {
            BufferTarget::Array => state.array_buffer = buffer,
            BufferTarget::ElementArray => state.element_buffer = buffer,
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        let mut state = self.state.lock();
        let Some(buffer) = state.bound_buffer(target) else {
            state.record_error(INVALID_OPERATION, "buffer_data with no buffer bound");
            return;
        };
        if let Some(contents) = state.buffers.get_mut(&buffer) {
            contents.clear();
            contents.extend_from_slice(data);
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer).is_none() {
            return;
        }
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        if state.element_buffer == Some(buffer) {
            state.element_buffer = None;
        }
        state.released(ObjectKind::Buffer);
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut state = self.state.lock();
        match state.vertex_slots.get_mut(location as usize) {
            Some(slot) => slot.enabled = true,
            None => state.record_error(INVALID_VALUE, "attribute location out of range"),
        }
    }

    fn vertex_attrib_pointer(&self, location: u32, pointer: &VertexPointer) {
        let mut state = self.state.lock();
        if !(1..=4).contains(&pointer.size) || pointer.stride < 0 || pointer.offset < 0 {
            state.record_error(INVALID_VALUE, "invalid vertex pointer layout");
            return;
        }
        let Some(buffer) = state.array_buffer else {
            state.record_error(INVALID_OPERATION, "vertex_attrib_pointer with no ARRAY_BUFFER");
            return;
        };
        match state.vertex_slots.get_mut(location as usize) {
            Some(slot) => slot.source = Some((*pointer, buffer)),
            None => state.record_error(INVALID_VALUE, "attribute location out of range"),
        }
    }

    fn vertex_attrib(&self, location: u32, value: AttribValue) {
        let mut state = self.state.lock();
        match state.vertex_slots.get_mut(location as usize) {
            Some(slot) => slot.constant = Some(value),
            None => state.record_error(INVALID_VALUE, "attribute location out of range"),
        }
    }

    fn uniform(&self, location: UniformLocation, value: &UniformValue) {
        let mut state = self.state.lock();
        let Some((program, name)) = state.uniform_locations.get(&location).cloned() else {
            state.record_error(INVALID_OPERATION, "uniform location from another program");
            return;
        };
        if state.current_program != Some(program) {
            state.record_error(INVALID_OPERATION, "uniform upload to a program not in use");
            return;
        }
        let Some(slot) = state
            .programs
            .get_mut(&program)
            .and_then(|p| p.uniforms.get_mut(&name))
        else {
            return;
        };
        let declared = &slot.declaration;
        let mut accepted = glsl::uniform_accepts(&declared.ty, value.glsl_type());
        if let UniformValue::FloatArray { components, values } = value {
            let width = usize::from(*components).max(1);
            let capacity = declared.array_len.unwrap_or(1) as usize;
            accepted &= values.len() % width == 0 && values.len() / width <= capacity;
        }
        if accepted {
            slot.value = Some(value.clone());
        } else {
            let message = format!(
                "uniform '{name}' is {} but received {}",
                declared.ty,
                value.glsl_type()
            );
            state.record_error(INVALID_OPERATION, &message);
        }
    }

    fn create_texture(&self) -> Option<TextureHandle> {
        let mut state = self.state.lock();
        let texture = state.allocate(ObjectKind::Texture)?;
        state.textures.insert(texture, RecordedTexture::default());
        Some(texture)
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.lock();
        if unit >= MAX_TEXTURE_UNITS {
            state.record_error(INVALID_ENUM, "texture unit out of range");
            return;
        }
        state.active_unit = unit;
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        let mut state = self.state.lock();
        let unit = state.active_unit;
        match texture {
            Some(handle) if !state.textures.contains_key(&handle) => {
                state.record_error(INVALID_OPERATION, "bind_texture with a deleted texture");
            }
            Some(handle) => {
                state.texture_units.insert(unit, handle);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
    }

    fn tex_parameter(&self, parameter: TextureParameter, value: u32) {
        let mut state = self.state.lock();
        let Some(texture) = state.bound_texture() else {
            state.record_error(INVALID_OPERATION, "tex_parameter with no texture bound");
            return;
        };
        if let Some(data) = state.textures.get_mut(&texture) {
            data.parameters.insert(parameter, value);
        }
    }

    fn pixel_store_flip_y(&self, flip: bool) {
        self.state.lock().flip_y = flip;
    }

    fn tex_image_2d(&self, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.lock();
        let Some(texture) = state.bound_texture() else {
            state.record_error(INVALID_OPERATION, "tex_image_2d with no texture bound");
            return;
        };
        let row = width as usize * 4;
        if pixels.len() != row * height as usize {
            state.record_error(INVALID_VALUE, "pixel data does not match image size");
            return;
        }
        let stored: Vec<u8> = if state.flip_y && row > 0 {
            pixels
                .chunks_exact(row)
                .rev()
                .flatten()
                .copied()
                .collect()
        } else {
            pixels.to_vec()
        };
        if let Some(data) = state.textures.get_mut(&texture) {
            data.width = width;
            data.height = height;
            data.pixels = stored;
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        if state.textures.remove(&texture).is_none() {
            return;
        }
        state.texture_units.retain(|_, bound| *bound != texture);
        state.released(ObjectKind::Texture);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.lock();
        if width < 0 || height < 0 {
            state.record_error(INVALID_VALUE, "negative viewport size");
            return;
        }
        state.viewport = [x, y, width, height];
    }

    fn clear_color(&self, color: Vec4) {
        self.state.lock().clear_color = color;
    }

    fn enable(&self, capability: Capability) {
        self.state.lock().capabilities.insert(capability);
    }

    fn clear(&self, mask: ClearMask) {
        let mut state = self.state.lock();
        let color = state.clear_color;
        state.draws.push(DrawCall::Clear { mask, color });
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        let mut state = self.state.lock();
        if first < 0 || count < 0 {
            state.record_error(INVALID_VALUE, "negative first or count");
            return;
        }
        let Some(program) = state.draw_program() else {
            return;
        };
        if !state.check_vertex_sources(program, first as usize + count as usize) {
            return;
        }
        let uniforms = state.uniform_snapshot(program);
        state.draws.push(DrawCall::Arrays {
            mode,
            first,
            count,
            program,
            uniforms,
        });
    }

    fn draw_elements(&self, mode: Primitive, count: i32, index_type: IndexType, offset: i32) {
        let mut state = self.state.lock();
        let size = index_type.size_in_bytes();
        if count < 0 || offset < 0 {
            state.record_error(INVALID_VALUE, "negative count or offset");
            return;
        }
        if offset as usize % size != 0 {
            state.record_error(INVALID_OPERATION, "offset not aligned to the index type");
            return;
        }
        let Some(program) = state.draw_program() else {
            return;
        };
        let Some(indices) = state
            .element_buffer
            .and_then(|buffer| state.buffers.get(&buffer))
        else {
            state.record_error(INVALID_OPERATION, "draw_elements with no ELEMENT_ARRAY_BUFFER");
            return;
        };
        let start = offset as usize;
        let end = start + count as usize * size;
        if end > indices.len() {
            let message = format!(
                "draw_elements reads {end} bytes, element buffer has {}",
                indices.len()
            );
            state.record_error(INVALID_OPERATION, &message);
            return;
        }
        let max_index = indices[start..end]
            .chunks_exact(size)
            .map(|bytes| match index_type {
                IndexType::UnsignedByte => u32::from(bytes[0]),
                IndexType::UnsignedShort => u32::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
                IndexType::UnsignedInt => {
                    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
                }
            })
            .max();
        let vertices = max_index.map_or(0, |max| max as usize + 1);
        if !state.check_vertex_sources(program, vertices) {
            return;
        }
        let uniforms = state.uniform_snapshot(program);
        state.draws.push(DrawCall::Elements {
            mode,
            count,
            index_type,
            offset,
            program,
            uniforms,
        });
    }

    fn get_error(&self) -> u32 {
        let mut state = self.state.lock();
        let error = state.error;
        if error != NO_ERROR {
            warn!("GL error 0x{error:04X} reported");
        }
        state.error = NO_ERROR;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 300 es
in vec4 position;
in float size;
uniform mat4 camera;
void main() {
  gl_Position = camera * position;
  gl_PointSize = size;
}";

    const FRAGMENT: &str = "#version 300 es
precision mediump float;
uniform vec4 color;
out vec4 fragColor;
void main() {
  fragColor = color;
}";

    fn linked_program(ctx: &RecordingContext) -> ProgramHandle {
        let vs = ctx.create_shader(ShaderStage::Vertex).unwrap();
        ctx.shader_source(vs, VERTEX);
        ctx.compile_shader(vs);
        let fs = ctx.create_shader(ShaderStage::Fragment).unwrap();
        ctx.shader_source(fs, FRAGMENT);
        ctx.compile_shader(fs);
        let program = ctx.create_program().unwrap();
        ctx.attach_shader(program, vs);
        ctx.attach_shader(program, fs);
        ctx.link_program(program);
        assert!(ctx.program_link_status(program), "{}", ctx.program_info_log(program));
        program
    }

    #[test]
    fn zero_area_canvas_is_rejected() {
        let err = RecordingContext::new(0, 400).unwrap_err();
        assert!(matches!(err, GlError::ContextUnavailable(_)));
    }

    #[test]
    fn compile_failure_sets_status_and_log() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let shader = ctx.create_shader(ShaderStage::Vertex).unwrap();
        ctx.shader_source(shader, "void main() {");
        ctx.compile_shader(shader);
        assert!(!ctx.shader_compile_status(shader));
        assert!(ctx.shader_info_log(shader).starts_with("ERROR:"));
    }

    #[test]
    fn linked_program_exposes_locations() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        assert_eq!(ctx.attrib_location(program, "position"), 0);
        assert_eq!(ctx.attrib_location(program, "size"), 1);
        assert_eq!(ctx.attrib_location(program, "missing"), -1);
        assert!(ctx.uniform_location(program, "camera").is_some());
        assert!(ctx.uniform_location(program, "missing").is_none());
    }

    #[test]
    fn uniform_type_mismatch_is_invalid_operation() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        ctx.use_program(Some(program));
        let color = ctx.uniform_location(program, "color").unwrap();
        ctx.uniform(color, &UniformValue::Vec3(glam::Vec3::ONE));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.uniform(color, &UniformValue::Vec4(Vec4::ONE));
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn draw_arrays_records_uniform_snapshot() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        ctx.use_program(Some(program));
        let location = ctx.attrib_location(program, "position") as u32;
        ctx.vertex_attrib(location, AttribValue::F4(Vec4::W));
        let color = ctx.uniform_location(program, "color").unwrap();
        ctx.uniform(color, &UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        ctx.clear(ClearMask::COLOR);
        ctx.draw_arrays(Primitive::Points, 0, 1);

        let draws = ctx.draw_calls();
        assert_eq!(draws.len(), 2);
        assert!(!draws[0].is_draw());
        assert_eq!(draws[1].describe(), "points first=0 count=1");
        assert_eq!(
            draws[1].uniform("color"),
            Some(&UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
        );
        assert_eq!(ctx.attribute_constant(location), Some(AttribValue::F4(Vec4::W)));
    }

    #[test]
    fn draw_without_program_is_rejected() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        ctx.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert!(ctx.draw_calls().is_empty());
    }

    #[test]
    fn draw_past_end_of_vertex_buffer_is_rejected() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        ctx.use_program(Some(program));
        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        ctx.buffer_data(BufferTarget::Array, bytemuck::cast_slice(&[0.0f32; 6]));
        ctx.enable_vertex_attrib_array(0);
        ctx.vertex_attrib_pointer(0, &VertexPointer::floats(3));

        ctx.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_arrays(Primitive::Lines, 0, 2);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.draw_calls().len(), 1);
    }

    #[test]
    fn huge_first_and_count_are_rejected_without_overflow() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        ctx.use_program(Some(program));
        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        ctx.buffer_data(BufferTarget::Array, bytemuck::cast_slice(&[0.0f32; 9]));
        ctx.enable_vertex_attrib_array(0);
        ctx.vertex_attrib_pointer(0, &VertexPointer::floats(3));

        ctx.draw_arrays(Primitive::Triangles, i32::MAX, i32::MAX);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_arrays(Primitive::Points, i32::MAX - 1, 1);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert!(ctx.draw_calls().is_empty());
    }

    #[test]
    fn draw_elements_checks_index_range() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let program = linked_program(&ctx);
        ctx.use_program(Some(program));
        let vertices = ctx.create_buffer().unwrap();
        ctx.bind_buffer(BufferTarget::Array, Some(vertices));
        ctx.buffer_data(BufferTarget::Array, bytemuck::cast_slice(&[0.0f32; 9]));
        ctx.enable_vertex_attrib_array(0);
        ctx.vertex_attrib_pointer(0, &VertexPointer::floats(3));
        let indices = ctx.create_buffer().unwrap();
        ctx.bind_buffer(BufferTarget::ElementArray, Some(indices));
        ctx.buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice(&[0u16, 1, 3]));

        ctx.draw_elements(Primitive::Triangles, 3, IndexType::UnsignedShort, 0);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        ctx.buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice(&[0u16, 1, 2]));
        ctx.draw_elements(Primitive::Triangles, 3, IndexType::UnsignedShort, 0);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.draw_calls()[0].describe(), "triangles count=3 indexed(u16)");
    }

    #[test]
    fn flipped_upload_stores_rows_bottom_up() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let texture = ctx.create_texture().unwrap();
        ctx.bind_texture(Some(texture));
        ctx.pixel_store_flip_y(true);
        let pixels = [1u8, 1, 1, 1, 2, 2, 2, 2];
        ctx.tex_image_2d(1, 2, &pixels);
        let stored = ctx.texture(texture).unwrap();
        assert_eq!(stored.pixels, vec![2, 2, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn denied_allocation_returns_none_once() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        ctx.deny_allocations(ObjectKind::Buffer, 1);
        assert!(ctx.create_buffer().is_none());
        assert!(ctx.create_buffer().is_some());
        assert_eq!(ctx.counts(ObjectKind::Buffer).created, 1);
    }

    #[test]
    fn deletions_balance_counts() {
        let ctx = RecordingContext::new(4, 4).unwrap();
        let buffer = ctx.create_buffer().unwrap();
        ctx.delete_buffer(buffer);
        ctx.delete_buffer(buffer);
        assert_eq!(
            ctx.counts(ObjectKind::Buffer),
            ObjectCounts {
                created: 1,
                deleted: 1
            }
        );
        assert_eq!(ctx.live_objects(), 0);
    }
}
