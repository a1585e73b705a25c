//! Pipelines for imported glTF primitives.
//!
//! Every primitive gets a pipeline matching its topology and vertex buffer
//! layouts. Primitives that agree on both share one pipeline through the
//! [`PipelineCache`]. All of them use the same shader module, picking the
//! vertex entry point by whether normals are present. Creation errors are
//! captured with a validation error scope and returned as [`LoadError`].

use std::collections::HashMap;

use crate::{
    data_structures::texture::Texture,
    pipelines::basic::{mk_render_pipeline, primitive_state},
    resources::gltf::{LoadError, NORMAL_LOCATION, PrimitivePlan},
};

pub const SHADER_NAME: &str = "gltf";
const SHADER_SOURCE: &str = include_str!("gltf.wgsl");

/// Layout of one vertex buffer holding a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKey {
    pub array_stride: u64,
    pub offset: u64,
    pub format: wgpu::VertexFormat,
    pub shader_location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub topology: wgpu::PrimitiveTopology,
    pub buffers: Vec<BufferKey>,
}

impl PipelineKey {
    pub fn from_plan(plan: &PrimitivePlan) -> Self {
        Self {
            topology: plan.topology,
            buffers: plan
                .attributes
                .iter()
                .map(|attribute| BufferKey {
                    array_stride: attribute.array_stride,
                    offset: attribute.offset,
                    format: attribute.format,
                    shader_location: attribute.shader_location,
                })
                .collect(),
        }
    }

    pub fn vertex_entry(&self) -> &'static str {
        if self
            .buffers
            .iter()
            .any(|buffer| buffer.shader_location == NORMAL_LOCATION)
        {
            "vs_position_normal"
        } else {
            "vs_position"
        }
    }
}

/// Group 1 of mesh pipelines: the node's model matrix.
pub fn node_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("node_bind_group_layout"),
    })
}

pub struct PipelineCache {
    color_format: wgpu::TextureFormat,
    layout: wgpu::PipelineLayout,
    shaders: HashMap<&'static str, wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });
        Self {
            color_format,
            layout,
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// The shader module registered under `name`, compiled on first use.
    /// A module the device rejects is not cached.
    pub async fn shader(
        &mut self,
        device: &wgpu::Device,
        name: &'static str,
        source: &'static str,
    ) -> Result<wgpu::ShaderModule, LoadError> {
        if let Some(shader) = self.shaders.get(name) {
            return Ok(shader.clone());
        }

        log::debug!("Compiling shader {}", name);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(LoadError::Shader {
                name,
                message: error.to_string(),
            });
        }
        self.shaders.insert(name, shader.clone());
        Ok(shader)
    }

    pub async fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        key: &PipelineKey,
    ) -> Result<wgpu::RenderPipeline, LoadError> {
        if let Some(pipeline) = self.pipelines.get(key) {
            return Ok(pipeline.clone());
        }

        let shader = self.shader(device, SHADER_NAME, SHADER_SOURCE).await?;
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .buffers
            .iter()
            .map(|buffer| {
                [wgpu::VertexAttribute {
                    format: buffer.format,
                    offset: buffer.offset,
                    shader_location: buffer.shader_location,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout> = key
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                array_stride: buffer.array_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        log::debug!("Creating mesh pipeline for {:?}", key);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = mk_render_pipeline(
            device,
            &self.layout,
            self.color_format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_FORMAT),
            &vertex_layouts,
            &shader,
            key.vertex_entry(),
            primitive_state(key.topology),
        );
        if let Some(error) = device.pop_error_scope().await {
            return Err(LoadError::Pipeline {
                key: format!("{:?}", key),
                message: error.to_string(),
            });
        }
        self.pipelines.insert(key.clone(), pipeline.clone());
        Ok(pipeline)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
