//! Frame rendering.
//!
//! The [`Renderer`] owns the frame uniform, the transform storage buffer and
//! the instanced pipeline. Each frame it uploads the packed [`FrameBatch`],
//! then issues one instanced draw per non-empty kind range, in batch order,
//! followed by every loaded glTF model.

use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, FrameUniform, Projection},
    context::{Context, InitError},
    data_structures::{
        batch::{CapacityError, FrameBatch, ObjectKind},
        material::{Material, material_layout},
        mesh::Mesh,
        model::{DrawModel, GltfModel},
        texture::Texture,
    },
    pipelines::basic::{frame_layout, mk_instanced_pipeline},
};

/// Size of one model matrix in the transform buffer.
pub const MATRIX_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Checkerboard colours per kind.
fn kind_colors(kind: ObjectKind) -> ([u8; 4], [u8; 4]) {
    match kind {
        ObjectKind::Triangle => ([230, 90, 70, 255], [250, 200, 120, 255]),
        ObjectKind::Quad => ([60, 60, 70, 255], [120, 120, 135, 255]),
        ObjectKind::Cube => ([70, 130, 220, 255], [170, 210, 250, 255]),
    }
}

struct KindResources {
    kind: ObjectKind,
    mesh: Mesh,
    material: Material,
}

pub struct Renderer {
    capacity: usize,
    projection: Projection,
    frame_uniform: FrameUniform,
    frame_buffer: wgpu::Buffer,
    transform_buffer: wgpu::Buffer,
    frame_layout: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    kinds: Vec<KindResources>,
    pub clear_colour: wgpu::Color,
}

impl Renderer {
    /// `capacity` is the number of model matrices the transform buffer holds.
    pub async fn new(ctx: &Context, capacity: usize) -> Result<Self, InitError> {
        let device = &ctx.device;
        let frame_uniform = FrameUniform::new();
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniform Buffer"),
            contents: bytemuck::cast_slice(&[frame_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Storage Buffer"),
            size: capacity.max(1) as u64 * MATRIX_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = frame_layout(device);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: transform_buffer.as_entire_binding(),
                },
            ],
            label: Some("frame_bind_group"),
        });

        let material_layout = material_layout(device);
        let pipeline =
            mk_instanced_pipeline(device, ctx.config.format, &frame_layout, &material_layout)
                .await?;

        let kinds = ObjectKind::ALL
            .into_iter()
            .map(|kind| {
                let (a, b) = kind_colors(kind);
                let texture = Texture::checkerboard(device, &ctx.queue, 8, a, b, kind.label());
                KindResources {
                    kind,
                    mesh: Mesh::for_kind(device, kind),
                    material: Material::new(device, kind.label(), texture, &material_layout),
                }
            })
            .collect();

        log::info!("Renderer ready, transform capacity {}", capacity);
        Ok(Self {
            capacity,
            projection: Projection::standard(ctx.config.width, ctx.config.height),
            frame_uniform,
            frame_buffer,
            transform_buffer,
            frame_layout,
            frame_bind_group,
            pipeline,
            material_layout,
            kinds,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
        })
    }

    /// Group 0 layout, shared with the glTF pipelines.
    pub fn frame_layout(&self) -> &wgpu::BindGroupLayout {
        &self.frame_layout
    }

    /// Replace the checkerboard of `kind` with `texture`.
    pub fn set_texture(&mut self, device: &wgpu::Device, kind: ObjectKind, texture: Texture) {
        if let Some(resources) = self.kinds.iter_mut().find(|r| r.kind == kind) {
            resources.material = Material::new(device, kind.label(), texture, &self.material_layout);
        }
    }

    /// Replace the built-in vertices of `kind` with `mesh`.
    pub fn set_mesh(&mut self, kind: ObjectKind, mesh: Mesh) {
        if let Some(resources) = self.kinds.iter_mut().find(|r| r.kind == kind) {
            resources.mesh = mesh;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    /// Upload the frame uniform and the packed transforms.
    pub fn upload(
        &mut self,
        queue: &wgpu::Queue,
        batch: &FrameBatch,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        if batch.len() > self.capacity {
            return Err(CapacityError {
                requested: batch.len(),
                capacity: self.capacity,
            }
            .into());
        }
        self.frame_uniform.update(camera, &self.projection);
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[self.frame_uniform]),
        );
        if !batch.is_empty() {
            queue.write_buffer(&self.transform_buffer, 0, batch.as_bytes());
        }
        Ok(())
    }

    /// Record the draws for one frame into `render_pass`.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        batch: &FrameBatch,
        models: &[GltfModel],
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for range in batch.ranges().iter().filter(|range| range.count > 0) {
            let Some(resources) = self.kinds.iter().find(|r| r.kind == range.kind) else {
                continue;
            };
            render_pass.set_bind_group(1, &resources.material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, resources.mesh.vertex_buffer.slice(..));
            render_pass.draw(0..resources.mesh.vertex_count, range.instances());
        }

        for model in models {
            render_pass.draw_model(model, &self.frame_bind_group);
        }
    }

    /// Acquire the next surface texture, draw the frame and present it.
    pub fn render(
        &mut self,
        ctx: &Context,
        batch: &FrameBatch,
        camera: &Camera,
        models: &[GltfModel],
    ) -> Result<(), RenderError> {
        self.upload(&ctx.queue, batch, camera)?;

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.draw(&mut render_pass, batch, models);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
