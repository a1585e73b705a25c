//! GPU-side glTF models and the render pass extension that draws them.

use cgmath::Matrix4;

/// A vertex buffer and the byte offset it is bound at.
#[derive(Debug)]
pub struct VertexBinding {
    pub buffer: wgpu::Buffer,
    pub offset: u64,
}

/// One drawable primitive: a cached pipeline, one vertex buffer per
/// attribute (slot order matches the pipeline's buffer layouts) and the
/// vertex count.
#[derive(Debug)]
pub struct GltfPrimitive {
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_buffers: Vec<VertexBinding>,
    pub draw_count: u32,
}

#[derive(Debug)]
pub struct GltfMesh {
    pub name: String,
    pub primitives: Vec<GltfPrimitive>,
}

/// A node placing a mesh in the world. The transform lives in a uniform
/// buffer bound at group 1.
#[derive(Debug)]
pub struct GltfNode {
    pub mesh: usize,
    pub transform: Matrix4<f32>,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct GltfModel {
    pub meshes: Vec<GltfMesh>,
    pub nodes: Vec<GltfNode>,
}

impl GltfModel {
    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.primitives.len()).sum()
    }
}

pub trait DrawModel {
    /// Draw every node of `model`. `frame_bind_group` provides view and
    /// projection at group 0.
    fn draw_model(&mut self, model: &GltfModel, frame_bind_group: &wgpu::BindGroup);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_model(&mut self, model: &GltfModel, frame_bind_group: &wgpu::BindGroup) {
        for node in &model.nodes {
            let Some(mesh) = model.meshes.get(node.mesh) else {
                continue;
            };
            for primitive in &mesh.primitives {
                self.set_pipeline(&primitive.pipeline);
                self.set_bind_group(0, frame_bind_group, &[]);
                self.set_bind_group(1, &node.bind_group, &[]);
                for (slot, binding) in primitive.vertex_buffers.iter().enumerate() {
                    self.set_vertex_buffer(slot as u32, binding.buffer.slice(binding.offset..));
                }
                self.draw(0..primitive.draw_count, 0..1);
            }
        }
    }
}
