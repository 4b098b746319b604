use bytemuck::Pod;

use super::context::{BufferHandle, BufferTarget, IndexType, Primitive, SharedContext};
use super::error::{GlError, GlResult};

/// Integer types usable as element indices.
pub trait IndexElement: Pod {
    const INDEX_TYPE: IndexType;
}

impl IndexElement for u8 {
    const INDEX_TYPE: IndexType = IndexType::UnsignedByte;
}

impl IndexElement for u16 {
    const INDEX_TYPE: IndexType = IndexType::UnsignedShort;
}

impl IndexElement for u32 {
    const INDEX_TYPE: IndexType = IndexType::UnsignedInt;
}

/// Element array buffer remembering the size and type of its last upload.
pub struct IndexBuffer {
    context: SharedContext,
    buffer: BufferHandle,
    count: usize,
    index_type: IndexType,
}

impl IndexBuffer {
    pub(crate) fn new(context: SharedContext) -> GlResult<Self> {
        let buffer = context.create_buffer().ok_or(GlError::BufferAllocation)?;
        Ok(Self {
            context,
            buffer,
            count: 0,
            index_type: IndexType::UnsignedShort,
        })
    }

    /// Replaces the buffer contents with `indices`.
    pub fn upload<T: IndexElement>(&mut self, indices: &[T]) {
        self.bind();
        self.context
            .buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice(indices));
        self.count = indices.len();
        self.index_type = T::INDEX_TYPE;
    }

    pub fn bind(&self) {
        self.context
            .bind_buffer(BufferTarget::ElementArray, Some(self.buffer));
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn handle(&self) -> BufferHandle {
        self.buffer
    }

    /// Draws every uploaded index with the current program.
    pub fn draw(&self, mode: Primitive) {
        self.bind();
        self.context
            .draw_elements(mode, self.count as i32, self.index_type, 0);
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.context.delete_buffer(self.buffer);
    }
}
