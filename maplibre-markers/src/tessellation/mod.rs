//! Tessellation for lines and polygons is implemented here.

use bytemuck::Pod;
use bytemuck_derive::{Pod, Zeroable};
use lyon::tessellation::{
    FillVertex, FillVertexConstructor, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

pub mod path_collector;

pub const DEFAULT_TOLERANCE: f32 = 0.02;

/// Alignment a buffer size must satisfy before it can be copied to the GPU.
pub const COPY_BUFFER_ALIGNMENT: u64 = 4;

/// Vertex buffers index data type.
pub type IndexDataType = u32;

/// Vertex of a marker mesh. Positions are in marker-local space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 2],
    pub normal: [f32; 2],
    pub color: [f32; 4],
}

impl MeshVertex {
    pub fn new(position: [f32; 2], normal: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

/// Constructor for Fill and Stroke vertices. Every vertex gets the same color.
pub struct VertexConstructor {
    pub color: [f32; 4],
}

impl FillVertexConstructor<MeshVertex> for VertexConstructor {
    fn new_vertex(&mut self, vertex: FillVertex) -> MeshVertex {
        MeshVertex::new(vertex.position().to_array(), [0.0, 0.0], self.color)
    }
}

impl StrokeVertexConstructor<MeshVertex> for VertexConstructor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> MeshVertex {
        MeshVertex::new(
            vertex.position().to_array(),
            vertex.normal().to_array(),
            self.color,
        )
    }
}

/// Vertex buffer which includes additional padding to fulfill the [`COPY_BUFFER_ALIGNMENT`].
#[derive(Clone, Debug)]
pub struct OverAlignedVertexBuffer<V, I> {
    pub buffer: VertexBuffers<V, I>,
    pub usable_indices: u32,
}

impl<V, I> OverAlignedVertexBuffer<V, I> {
    pub fn empty() -> Self {
        Self {
            buffer: VertexBuffers::with_capacity(0, 0),
            usable_indices: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.usable_indices == 0
    }

    pub fn vertex_count(&self) -> usize {
        self.buffer.vertices.len()
    }
}

impl<V: Pod, I: Pod> From<VertexBuffers<V, I>> for OverAlignedVertexBuffer<V, I> {
    fn from(mut buffer: VertexBuffers<V, I>) -> Self {
        let usable_indices = buffer.indices.len() as u32;
        buffer.align_indices();
        Self {
            buffer,
            usable_indices,
        }
    }
}

/// The renderable output of a style builder.
pub type Mesh = OverAlignedVertexBuffer<MeshVertex, IndexDataType>;

trait Align<V: Pod, I: Pod> {
    fn align_indices(&mut self);
}

impl<V: Pod, I: Pod> Align<V, I> for VertexBuffers<V, I> {
    fn align_indices(&mut self) {
        let align = COPY_BUFFER_ALIGNMENT;
        let stride = std::mem::size_of::<I>() as u64;
        let unpadded_bytes = self.indices.len() as u64 * stride;
        let padding_bytes = (align - unpadded_bytes % align) % align;
        let overpad = (padding_bytes + stride - 1) / stride; // Divide by stride but round up

        for _ in 0..overpad {
            self.indices.push(I::zeroed());
        }
    }
}
