//! Built-in meshes for the instanced object kinds.
//!
//! Every kind shares the same vertex layout (position + uv, 20 bytes), which is
//! what lets one pipeline draw all of them.

use wgpu::util::DeviceExt;

use crate::data_structures::batch::ObjectKind;

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

const fn v(x: f32, y: f32, z: f32, u: f32, w: f32) -> MeshVertex {
    MeshVertex {
        position: [x, y, z],
        tex_coords: [u, w],
    }
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

pub const TRIANGLE_VERTICES: [MeshVertex; 3] = [
    v(0.0, 0.0, 0.5, 0.5, 0.0),
    v(0.0, -0.5, -0.5, 0.0, 1.0),
    v(0.0, 0.5, -0.5, 1.0, 1.0),
];

// Lies in the XY plane, facing +Z.
pub const QUAD_VERTICES: [MeshVertex; 6] = [
    v(-0.5, -0.5, 0.0, 0.0, 0.0),
    v(0.5, -0.5, 0.0, 1.0, 0.0),
    v(0.5, 0.5, 0.0, 1.0, 1.0),
    v(0.5, 0.5, 0.0, 1.0, 1.0),
    v(-0.5, 0.5, 0.0, 0.0, 1.0),
    v(-0.5, -0.5, 0.0, 0.0, 0.0),
];

pub const CUBE_VERTICES: [MeshVertex; 36] = [
    // -Z
    v(1.0, -1.0, -1.0, 1.0, 1.0),
    v(-1.0, -1.0, -1.0, 0.0, 1.0),
    v(-1.0, 1.0, -1.0, 0.0, 0.0),
    v(-1.0, 1.0, -1.0, 0.0, 0.0),
    v(1.0, 1.0, -1.0, 1.0, 0.0),
    v(1.0, -1.0, -1.0, 1.0, 1.0),
    // +Z
    v(-1.0, -1.0, 1.0, 0.0, 1.0),
    v(1.0, -1.0, 1.0, 1.0, 1.0),
    v(1.0, 1.0, 1.0, 1.0, 0.0),
    v(1.0, 1.0, 1.0, 1.0, 0.0),
    v(-1.0, 1.0, 1.0, 0.0, 0.0),
    v(-1.0, -1.0, 1.0, 0.0, 1.0),
    // -X
    v(-1.0, -1.0, -1.0, 0.0, 1.0),
    v(-1.0, -1.0, 1.0, 1.0, 1.0),
    v(-1.0, 1.0, 1.0, 1.0, 0.0),
    v(-1.0, 1.0, 1.0, 1.0, 0.0),
    v(-1.0, 1.0, -1.0, 0.0, 0.0),
    v(-1.0, -1.0, -1.0, 0.0, 1.0),
    // +X
    v(1.0, -1.0, 1.0, 0.0, 1.0),
    v(1.0, -1.0, -1.0, 1.0, 1.0),
    v(1.0, 1.0, -1.0, 1.0, 0.0),
    v(1.0, 1.0, -1.0, 1.0, 0.0),
    v(1.0, 1.0, 1.0, 0.0, 0.0),
    v(1.0, -1.0, 1.0, 0.0, 1.0),
    // -Y
    v(-1.0, -1.0, -1.0, 0.0, 1.0),
    v(1.0, -1.0, -1.0, 1.0, 1.0),
    v(1.0, -1.0, 1.0, 1.0, 0.0),
    v(1.0, -1.0, 1.0, 1.0, 0.0),
    v(-1.0, -1.0, 1.0, 0.0, 0.0),
    v(-1.0, -1.0, -1.0, 0.0, 1.0),
    // +Y
    v(1.0, 1.0, -1.0, 0.0, 1.0),
    v(-1.0, 1.0, -1.0, 1.0, 1.0),
    v(-1.0, 1.0, 1.0, 1.0, 0.0),
    v(-1.0, 1.0, 1.0, 1.0, 0.0),
    v(1.0, 1.0, 1.0, 0.0, 0.0),
    v(1.0, 1.0, -1.0, 0.0, 1.0),
];

/// CPU-side vertices for a kind.
pub fn vertices_for(kind: ObjectKind) -> &'static [MeshVertex] {
    match kind {
        ObjectKind::Triangle => &TRIANGLE_VERTICES,
        ObjectKind::Quad => &QUAD_VERTICES,
        ObjectKind::Cube => &CUBE_VERTICES,
    }
}

/// A non-indexed vertex buffer and the number of vertices to draw from it.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[MeshVertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub fn for_kind(device: &wgpu::Device, kind: ObjectKind) -> Self {
        Self::new(device, kind.label(), vertices_for(kind))
    }
}
