use log::debug;

use super::context::{AttribValue, BufferHandle, BufferTarget, ProgramHandle, SharedContext, VertexPointer};
use super::error::{GlError, GlResult};

/// A vertex shader input resolved to its slot, with the array buffer that
/// feeds it.
///
/// The buffer is owned by the binding and released when it is dropped.
pub struct AttributeBinding {
    context: SharedContext,
    name: String,
    location: u32,
    buffer: BufferHandle,
    pointer: VertexPointer,
}

impl AttributeBinding {
    pub(crate) fn new(
        context: SharedContext,
        program: ProgramHandle,
        name: &str,
        pointer: VertexPointer,
    ) -> GlResult<Self> {
        let location = context.attrib_location(program, name);
        if location < 0 {
            return Err(GlError::AttributeNotFound {
                name: name.to_string(),
            });
        }
        let buffer = context.create_buffer().ok_or(GlError::BufferAllocation)?;
        debug!("attribute '{name}' resolved to slot {location}");
        Ok(Self {
            context,
            name: name.to_string(),
            location: location as u32,
            buffer,
            pointer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Layout applied by [`vertex_attrib_pointer`](Self::vertex_attrib_pointer).
    pub fn pointer(&self) -> VertexPointer {
        self.pointer
    }

    /// Replaces the whole buffer with `data`.
    pub fn bind_data(&self, data: &[f32]) {
        self.context.bind_buffer(BufferTarget::Array, Some(self.buffer));
        self.context
            .buffer_data(BufferTarget::Array, bytemuck::cast_slice(data));
    }

    /// Enables the slot and points it at this binding's buffer.
    pub fn vertex_attrib_pointer(&self) {
        self.context.enable_vertex_attrib_array(self.location);
        self.context.bind_buffer(BufferTarget::Array, Some(self.buffer));
        self.context
            .vertex_attrib_pointer(self.location, &self.pointer);
    }

    /// Stores `pointer` as the new layout and applies it. The layout sticks
    /// for later [`vertex_attrib_pointer`](Self::vertex_attrib_pointer) calls;
    /// use struct update syntax on [`pointer`](Self::pointer) to change a
    /// single field.
    pub fn vertex_attrib_pointer_with(&mut self, pointer: VertexPointer) {
        self.pointer = pointer;
        self.vertex_attrib_pointer();
    }

    /// Feeds the slot a constant value. Only visible while the array is
    /// disabled.
    pub fn set_constant(&self, value: AttribValue) {
        self.context.vertex_attrib(self.location, value);
    }
}

impl Drop for AttributeBinding {
    fn drop(&mut self) {
        self.context.delete_buffer(self.buffer);
    }
}

impl std::fmt::Debug for AttributeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeBinding")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("buffer", &self.buffer)
            .field("pointer", &self.pointer)
            .finish()
    }
}
