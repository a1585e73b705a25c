use gltf::{
    accessor::{DataType, Dimensions},
    mesh::Mode,
};
use instanced_ngin::resources::gltf::{
    LoadError, is_float_format, padded_bytes, primitive_topology, vertex_format,
};
use wgpu::{PrimitiveTopology, VertexFormat};

#[test]
fn should_map_float_accessors() {
    let cases = [
        (Dimensions::Scalar, VertexFormat::Float32),
        (Dimensions::Vec2, VertexFormat::Float32x2),
        (Dimensions::Vec3, VertexFormat::Float32x3),
        (Dimensions::Vec4, VertexFormat::Float32x4),
    ];
    for (dimensions, expected) in cases {
        assert_eq!(vertex_format(DataType::F32, dimensions, false).unwrap(), expected);
    }
}

#[test]
fn should_pick_normalized_variants_by_flag() {
    assert_eq!(
        vertex_format(DataType::U8, Dimensions::Vec4, true).unwrap(),
        VertexFormat::Unorm8x4
    );
    assert_eq!(
        vertex_format(DataType::U8, Dimensions::Vec4, false).unwrap(),
        VertexFormat::Uint8x4
    );
    assert_eq!(
        vertex_format(DataType::I16, Dimensions::Vec2, true).unwrap(),
        VertexFormat::Snorm16x2
    );
    assert_eq!(
        vertex_format(DataType::I16, Dimensions::Vec2, false).unwrap(),
        VertexFormat::Sint16x2
    );
    assert_eq!(
        vertex_format(DataType::U32, Dimensions::Vec3, false).unwrap(),
        VertexFormat::Uint32x3
    );
}

#[test]
fn should_reject_tuples_without_a_format() {
    let unsupported = [
        (DataType::U8, Dimensions::Vec3, false),
        (DataType::I16, Dimensions::Vec3, true),
        (DataType::F32, Dimensions::Mat4, false),
        (DataType::F32, Dimensions::Vec3, true),
        (DataType::U32, Dimensions::Scalar, true),
    ];
    for (data_type, dimensions, normalized) in unsupported {
        match vertex_format(data_type, dimensions, normalized) {
            Err(LoadError::UnsupportedFormat {
                data_type: d,
                dimensions: n,
                normalized: f,
            }) => {
                assert_eq!((d, n, f), (data_type, dimensions, normalized));
            }
            other => panic!(
                "{:?} {:?} {}: expected unsupported, got {:?}",
                data_type, dimensions, normalized, other
            ),
        }
    }
}

#[test]
fn should_be_deterministic() {
    for _ in 0..3 {
        assert_eq!(
            vertex_format(DataType::U16, Dimensions::Vec2, true).unwrap(),
            VertexFormat::Unorm16x2
        );
    }
}

#[test]
fn should_map_modes_to_topologies() {
    assert_eq!(primitive_topology(Mode::Triangles), PrimitiveTopology::TriangleList);
    assert_eq!(primitive_topology(Mode::TriangleStrip), PrimitiveTopology::TriangleStrip);
    assert_eq!(primitive_topology(Mode::Lines), PrimitiveTopology::LineList);
    assert_eq!(primitive_topology(Mode::LineStrip), PrimitiveTopology::LineStrip);
    assert_eq!(primitive_topology(Mode::Points), PrimitiveTopology::PointList);
}

#[test]
fn should_fall_back_to_triangle_list() {
    assert_eq!(primitive_topology(Mode::LineLoop), PrimitiveTopology::TriangleList);
    assert_eq!(primitive_topology(Mode::TriangleFan), PrimitiveTopology::TriangleList);
}

#[test]
fn should_only_feed_float_formats_to_the_shader() {
    assert!(is_float_format(VertexFormat::Float32x3));
    assert!(is_float_format(VertexFormat::Snorm16x4));
    assert!(is_float_format(VertexFormat::Unorm8x2));
    assert!(!is_float_format(VertexFormat::Uint32x3));
    assert!(!is_float_format(VertexFormat::Sint8x4));
}

#[test]
fn should_pad_to_four_bytes() {
    assert_eq!(padded_bytes(&[1, 2, 3, 4, 5]), vec![1, 2, 3, 4, 5, 0, 0, 0]);
    assert_eq!(padded_bytes(&[1, 2, 3, 4]), vec![1, 2, 3, 4]);
    assert!(padded_bytes(&[]).is_empty());
}
