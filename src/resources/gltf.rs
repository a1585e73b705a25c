//! glTF mesh import.
//!
//! Loading happens in three steps:
//!
//! 1. [`fetch`] reads the document and every buffer it references. Buffer
//!    fetches run concurrently; the first failure aborts the whole load.
//! 2. [`plan`] walks meshes and nodes and works out, without touching the GPU,
//!    which bytes every vertex buffer holds, the vertex format and stride of each
//!    attribute, the primitive topology and the draw count.
//! 3. [`GltfLoader::build`] turns the plan into vertex buffers, pipelines (shared
//!    through a [`PipelineCache`]) and per-node uniform bind groups. Shader and
//!    pipeline creation run inside a validation error scope, so a rejected
//!    layout surfaces as a [`LoadError`] rather than a device panic.
//!
//! Only `POSITION` and `NORMAL` are consumed. Other attributes are skipped.
//! Geometry is drawn non-indexed.

use cgmath::Matrix4;
use futures::future::try_join_all;
use gltf::{
    Semantic,
    accessor::{DataType, Dimensions},
    mesh::Mode,
};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Transform, TransformRaw},
        model::{GltfMesh, GltfModel, GltfNode, GltfPrimitive, VertexBinding},
    },
    pipelines::gltf::{PipelineCache, PipelineKey, node_layout},
    resources::{FetchError, load_binary, resolve_uri},
};

pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse glTF document {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: gltf::Error,
    },
    #[error("buffer {buffer} has no data source this loader can fetch")]
    UnsupportedBufferSource { buffer: usize },
    #[error("no vertex format for {dimensions:?} of {data_type:?} (normalized: {normalized})")]
    UnsupportedFormat {
        data_type: DataType,
        dimensions: Dimensions,
        normalized: bool,
    },
    #[error("accessor {accessor} has no buffer view")]
    MissingBufferView { accessor: usize },
    #[error("buffer view {view} references buffer {buffer}, which was not loaded")]
    MissingBuffer { view: usize, buffer: usize },
    #[error("buffer view {view} spans bytes {start}..{end} of buffer {buffer}, which holds {len}")]
    BufferOutOfRange {
        view: usize,
        buffer: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("accessor {accessor} needs {needed} bytes of its buffer view, which holds {available}")]
    AccessorOutOfRange {
        accessor: usize,
        needed: usize,
        available: usize,
    },
    #[error(
        "mesh {mesh} primitive {primitive}: attribute {semantic:?} has {found} elements, expected {expected}"
    )]
    AttributeCountMismatch {
        mesh: usize,
        primitive: usize,
        semantic: Semantic,
        expected: usize,
        found: usize,
    },
    #[error("mesh {mesh} primitive {primitive} has no POSITION attribute")]
    MissingPosition { mesh: usize, primitive: usize },
    #[error(
        "accessor {accessor} cannot be bound: {format:?} at offset {offset} of a {array_stride}-byte stride, bind offset {binding_offset}"
    )]
    InvalidLayout {
        accessor: usize,
        format: wgpu::VertexFormat,
        array_stride: u64,
        offset: u64,
        binding_offset: u64,
    },
    #[error("could not compile shader {name}: {message}")]
    Shader { name: &'static str, message: String },
    #[error("could not create the mesh pipeline for {key}: {message}")]
    Pipeline { key: String, message: String },
    #[error("attribute {semantic:?} uses {format:?}, which the mesh shader cannot read as floats")]
    IncompatibleAttribute {
        semantic: Semantic,
        format: wgpu::VertexFormat,
    },
}

/// The vertex format for an accessor's component type, component count and
/// normalized flag.
pub fn vertex_format(
    data_type: DataType,
    dimensions: Dimensions,
    normalized: bool,
) -> Result<wgpu::VertexFormat, LoadError> {
    use wgpu::VertexFormat as F;

    let unsupported = || LoadError::UnsupportedFormat {
        data_type,
        dimensions,
        normalized,
    };
    let format = match (data_type, normalized, dimensions) {
        (DataType::F32, false, Dimensions::Scalar) => F::Float32,
        (DataType::F32, false, Dimensions::Vec2) => F::Float32x2,
        (DataType::F32, false, Dimensions::Vec3) => F::Float32x3,
        (DataType::F32, false, Dimensions::Vec4) => F::Float32x4,

        (DataType::U32, false, Dimensions::Scalar) => F::Uint32,
        (DataType::U32, false, Dimensions::Vec2) => F::Uint32x2,
        (DataType::U32, false, Dimensions::Vec3) => F::Uint32x3,
        (DataType::U32, false, Dimensions::Vec4) => F::Uint32x4,

        (DataType::I8, false, Dimensions::Scalar) => F::Sint8,
        (DataType::I8, false, Dimensions::Vec2) => F::Sint8x2,
        (DataType::I8, false, Dimensions::Vec4) => F::Sint8x4,
        (DataType::I8, true, Dimensions::Scalar) => F::Snorm8,
        (DataType::I8, true, Dimensions::Vec2) => F::Snorm8x2,
        (DataType::I8, true, Dimensions::Vec4) => F::Snorm8x4,

        (DataType::U8, false, Dimensions::Scalar) => F::Uint8,
        (DataType::U8, false, Dimensions::Vec2) => F::Uint8x2,
        (DataType::U8, false, Dimensions::Vec4) => F::Uint8x4,
        (DataType::U8, true, Dimensions::Scalar) => F::Unorm8,
        (DataType::U8, true, Dimensions::Vec2) => F::Unorm8x2,
        (DataType::U8, true, Dimensions::Vec4) => F::Unorm8x4,

        (DataType::I16, false, Dimensions::Scalar) => F::Sint16,
        (DataType::I16, false, Dimensions::Vec2) => F::Sint16x2,
        (DataType::I16, false, Dimensions::Vec4) => F::Sint16x4,
        (DataType::I16, true, Dimensions::Scalar) => F::Snorm16,
        (DataType::I16, true, Dimensions::Vec2) => F::Snorm16x2,
        (DataType::I16, true, Dimensions::Vec4) => F::Snorm16x4,

        (DataType::U16, false, Dimensions::Scalar) => F::Uint16,
        (DataType::U16, false, Dimensions::Vec2) => F::Uint16x2,
        (DataType::U16, false, Dimensions::Vec4) => F::Uint16x4,
        (DataType::U16, true, Dimensions::Scalar) => F::Unorm16,
        (DataType::U16, true, Dimensions::Vec2) => F::Unorm16x2,
        (DataType::U16, true, Dimensions::Vec4) => F::Unorm16x4,

        // 3-component 8/16-bit formats do not exist, neither do matrices,
        // normalized floats or normalized 32-bit integers.
        _ => return Err(unsupported()),
    };
    Ok(format)
}

/// Topology for a primitive mode. Modes without a wgpu equivalent
/// (`LineLoop`, `TriangleFan`) fall back to a triangle list.
pub fn primitive_topology(mode: Mode) -> wgpu::PrimitiveTopology {
    match mode {
        Mode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Mode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Mode::Lines => wgpu::PrimitiveTopology::LineList,
        Mode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Mode::Points => wgpu::PrimitiveTopology::PointList,
        _ => wgpu::PrimitiveTopology::TriangleList,
    }
}

/// Shader location of the attributes the mesh shader reads.
pub fn shader_location(semantic: &Semantic) -> Option<u32> {
    match semantic {
        Semantic::Positions => Some(POSITION_LOCATION),
        Semantic::Normals => Some(NORMAL_LOCATION),
        _ => None,
    }
}

/// Formats a `vec*<f32>` shader input can consume.
pub fn is_float_format(format: wgpu::VertexFormat) -> bool {
    use wgpu::VertexFormat as F;
    matches!(
        format,
        F::Float32
            | F::Float32x2
            | F::Float32x3
            | F::Float32x4
            | F::Unorm8
            | F::Unorm8x2
            | F::Unorm8x4
            | F::Snorm8
            | F::Snorm8x2
            | F::Snorm8x4
            | F::Unorm16
            | F::Unorm16x2
            | F::Unorm16x4
            | F::Snorm16
            | F::Snorm16x2
            | F::Snorm16x4
    )
}

/// `bytes` copied and zero-padded to a multiple of 4, as buffer uploads require.
pub fn padded_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(4) * 4;
    let mut data = Vec::with_capacity(padded_len);
    data.extend_from_slice(bytes);
    data.resize(padded_len, 0);
    data
}

/// One attribute that survives the allow-list: where its bytes live and how
/// the pipeline reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePlan {
    pub semantic: Semantic,
    pub shader_location: u32,
    pub format: wgpu::VertexFormat,
    pub array_stride: u64,
    /// Offset of the attribute inside one stride.
    pub offset: u64,
    /// Bytes skipped at bind time: whole strides of an interleaved view, or
    /// the full accessor offset of a tightly packed one.
    pub binding_offset: u64,
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub count: usize,
}

impl AttributePlan {
    /// The exact bytes of the buffer view this attribute reads from.
    pub fn bytes<'b>(&self, buffers: &'b [Vec<u8>]) -> &'b [u8] {
        &buffers[self.buffer][self.byte_offset..self.byte_offset + self.byte_length]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitivePlan {
    pub mesh: usize,
    pub primitive: usize,
    pub attributes: Vec<AttributePlan>,
    pub topology: wgpu::PrimitiveTopology,
    pub draw_count: u32,
}

impl PrimitivePlan {
    pub fn has_normals(&self) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.shader_location == NORMAL_LOCATION)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPlan {
    pub index: usize,
    pub name: Option<String>,
    pub primitives: Vec<PrimitivePlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePlan {
    pub index: usize,
    pub mesh: usize,
    pub transform: Matrix4<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub meshes: Vec<MeshPlan>,
    pub nodes: Vec<NodePlan>,
}

/// Fetch the document at `url` and all of its buffers.
pub async fn fetch(url: &str) -> Result<(gltf::Document, Vec<Vec<u8>>), LoadError> {
    let bytes = load_binary(url)
        .await
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(&bytes).map_err(|source| LoadError::Parse {
            url: url.to_string(),
            source,
        })?;
    let buffers = fetch_buffers(url, &document, blob).await?;
    log::info!(
        "Loaded {} with {} meshes, {} nodes and {} buffers",
        url,
        document.meshes().len(),
        document.nodes().len(),
        buffers.len()
    );
    Ok((document, buffers))
}

enum PendingBuffer {
    Blob(Vec<u8>),
    Uri(String),
}

async fn fetch_buffers(
    url: &str,
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
) -> Result<Vec<Vec<u8>>, LoadError> {
    let mut pending = Vec::new();
    for buffer in document.buffers() {
        let source = match buffer.source() {
            gltf::buffer::Source::Bin => blob.take().map(PendingBuffer::Blob),
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => None,
            gltf::buffer::Source::Uri(uri) => Some(PendingBuffer::Uri(resolve_uri(url, uri))),
        };
        match source {
            Some(source) => pending.push(source),
            None => {
                return Err(LoadError::UnsupportedBufferSource {
                    buffer: buffer.index(),
                });
            }
        }
    }

    try_join_all(pending.into_iter().map(|source| async move {
        match source {
            PendingBuffer::Blob(data) => Ok(data),
            PendingBuffer::Uri(url) => {
                let result = load_binary(&url).await;
                result.map_err(|source| LoadError::Fetch { url, source })
            }
        }
    }))
    .await
}

/// Work out vertex layouts and node transforms for every mesh and node.
pub fn plan(document: &gltf::Document, buffers: &[Vec<u8>]) -> Result<DocumentPlan, LoadError> {
    let meshes = document
        .meshes()
        .map(|mesh| {
            let primitives = mesh
                .primitives()
                .map(|primitive| plan_primitive(mesh.index(), &primitive, buffers))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MeshPlan {
                index: mesh.index(),
                name: mesh.name().map(str::to_string),
                primitives,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let nodes = document
        .nodes()
        .filter_map(|node| {
            node.mesh().map(|mesh| NodePlan {
                index: node.index(),
                mesh: mesh.index(),
                transform: node_transform(&node.transform()),
            })
        })
        .collect();

    Ok(DocumentPlan { meshes, nodes })
}

pub fn plan_primitive(
    mesh: usize,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
) -> Result<PrimitivePlan, LoadError> {
    let mut attributes = Vec::new();
    for (semantic, accessor) in primitive.attributes() {
        let Some(shader_location) = shader_location(&semantic) else {
            log::debug!(
                "mesh {} primitive {}: skipping attribute {:?}",
                mesh,
                primitive.index(),
                semantic
            );
            continue;
        };
        let view = accessor.view().ok_or(LoadError::MissingBufferView {
            accessor: accessor.index(),
        })?;

        let buffer = view.buffer().index();
        let data = buffers.get(buffer).ok_or(LoadError::MissingBuffer {
            view: view.index(),
            buffer,
        })?;
        let start = view.offset();
        let end = start + view.length();
        if end > data.len() {
            return Err(LoadError::BufferOutOfRange {
                view: view.index(),
                buffer,
                start,
                end,
                len: data.len(),
            });
        }

        let format = vertex_format(accessor.data_type(), accessor.dimensions(), accessor.normalized())?;
        if !is_float_format(format) {
            return Err(LoadError::IncompatibleAttribute { semantic, format });
        }

        let element_size = accessor.size();
        let array_stride = view.stride().unwrap_or(element_size);
        let needed = match accessor.count() {
            0 => 0,
            count => accessor.offset() + array_stride * (count - 1) + element_size,
        };
        if needed > view.length() {
            return Err(LoadError::AccessorOutOfRange {
                accessor: accessor.index(),
                needed,
                available: view.length(),
            });
        }

        let (offset, binding_offset) = match (view.stride(), accessor.count()) {
            (_, 0) => (0, 0),
            // Tightly packed: the element is the whole stride, so the
            // accessor offset moves the binding instead.
            (None, _) => (0, accessor.offset()),
            (Some(stride), _) => {
                let offset = accessor.offset() % stride;
                (offset, accessor.offset() - offset)
            }
        };
        check_layout(accessor.index(), format, array_stride, offset, binding_offset)?;
        attributes.push(AttributePlan {
            semantic,
            shader_location,
            format,
            array_stride: array_stride as u64,
            offset: offset as u64,
            binding_offset: binding_offset as u64,
            buffer,
            byte_offset: start,
            byte_length: view.length(),
            count: accessor.count(),
        });
    }

    let position = attributes
        .iter()
        .find(|attribute| attribute.shader_location == POSITION_LOCATION)
        .ok_or(LoadError::MissingPosition {
            mesh,
            primitive: primitive.index(),
        })?;
    let draw_count = position.count;
    if let Some(other) = attributes.iter().find(|attribute| attribute.count != draw_count) {
        return Err(LoadError::AttributeCountMismatch {
            mesh,
            primitive: primitive.index(),
            semantic: other.semantic.clone(),
            expected: draw_count,
            found: other.count,
        });
    }

    Ok(PrimitivePlan {
        mesh,
        primitive: primitive.index(),
        attributes,
        topology: primitive_topology(primitive.mode()),
        draw_count: draw_count as u32,
    })
}

/// Reject layouts wgpu would refuse: attributes spilling out of their stride,
/// strides or attribute offsets off their alignment, and bind offsets that
/// are not a multiple of 4.
fn check_layout(
    accessor: usize,
    format: wgpu::VertexFormat,
    array_stride: usize,
    offset: usize,
    binding_offset: usize,
) -> Result<(), LoadError> {
    let size = format.size() as usize;
    let alignment = size.min(4);
    let valid = offset + size <= array_stride
        && array_stride % 4 == 0
        && offset % alignment == 0
        && binding_offset % 4 == 0;
    if valid {
        return Ok(());
    }
    Err(LoadError::InvalidLayout {
        accessor,
        format,
        array_stride: array_stride as u64,
        offset: offset as u64,
        binding_offset: binding_offset as u64,
    })
}

/// A node's explicit matrix verbatim, or `T * R * S` from its components.
pub fn node_transform(transform: &gltf::scene::Transform) -> Matrix4<f32> {
    match transform {
        gltf::scene::Transform::Matrix { matrix } => Matrix4::from(*matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform::from_trs(*translation, *rotation, *scale).to_matrix(),
    }
}

/// Builds GPU resources for glTF documents.
///
/// Pipelines and the shader module are cached per loader, so loading several
/// documents with the same vertex layouts reuses them.
pub struct GltfLoader {
    device: wgpu::Device,
    node_layout: wgpu::BindGroupLayout,
    cache: PipelineCache,
}

impl GltfLoader {
    /// `frame_layout` is the renderer's group 0 layout; meshes read view and
    /// projection from its binding 0.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let node_layout = node_layout(device);
        let cache = PipelineCache::new(device, color_format, &[frame_layout, &node_layout]);
        Self {
            device: device.clone(),
            node_layout,
            cache,
        }
    }

    pub async fn load(&mut self, url: &str) -> Result<GltfModel, LoadError> {
        let (document, buffers) = fetch(url).await?;
        let plan = plan(&document, &buffers)?;
        self.build(&plan, &buffers).await
    }

    /// Create the GPU resources described by `plan`. Fails if the device
    /// rejects a shader or pipeline.
    pub async fn build(
        &mut self,
        plan: &DocumentPlan,
        buffers: &[Vec<u8>],
    ) -> Result<GltfModel, LoadError> {
        let mut meshes = Vec::with_capacity(plan.meshes.len());
        for mesh in &plan.meshes {
            let mut primitives = Vec::with_capacity(mesh.primitives.len());
            for primitive in &mesh.primitives {
                primitives.push(self.build_primitive(primitive, buffers).await?);
            }
            meshes.push(GltfMesh {
                name: mesh
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("mesh {}", mesh.index)),
                primitives,
            });
        }

        let nodes = plan
            .nodes
            .iter()
            .map(|node| {
                let raw = TransformRaw::from(node.transform);
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("Node {} Transform Buffer", node.index)),
                        contents: bytemuck::cast_slice(&[raw]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    });
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.node_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("node_bind_group"),
                });
                GltfNode {
                    mesh: node.mesh,
                    transform: node.transform,
                    buffer,
                    bind_group,
                }
            })
            .collect();

        log::info!("{} pipelines cached after build", self.cache.len());
        Ok(GltfModel { meshes, nodes })
    }

    async fn build_primitive(
        &mut self,
        plan: &PrimitivePlan,
        buffers: &[Vec<u8>],
    ) -> Result<GltfPrimitive, LoadError> {
        let pipeline = self
            .cache
            .get_or_create(&self.device, &PipelineKey::from_plan(plan))
            .await?;
        let vertex_buffers = plan
            .attributes
            .iter()
            .map(|attribute| {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Vertex Buffer"),
                        contents: &padded_bytes(attribute.bytes(buffers)),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                VertexBinding {
                    buffer,
                    offset: attribute.binding_offset,
                }
            })
            .collect();

        Ok(GltfPrimitive {
            pipeline,
            vertex_buffers,
            draw_count: plan.draw_count,
        })
    }

    pub fn cached_pipelines(&self) -> usize {
        self.cache.len()
    }
}
