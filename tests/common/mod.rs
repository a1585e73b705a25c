#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

pub const TRIANGLE_POSITIONS: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
pub const TRIANGLE_NORMALS: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

/// A glTF document and its binary buffer written to a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub url: String,
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Write `json` as `model.gltf` and, when given, `bin` as `model.bin` next to it.
pub fn write_fixture(json: &str, bin: Option<&[u8]>) -> Fixture {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(dir.path().join("model.gltf"), json).expect("failed to write document");
    if let Some(bin) = bin {
        std::fs::write(dir.path().join("model.bin"), bin).expect("failed to write buffer");
    }
    let url = path_to_url(&dir.path().join("model.gltf"));
    Fixture { dir, url }
}

pub fn path_to_url(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// A document with one buffer (`model.bin` of `byte_length` bytes), a single
/// mesh with one primitive and one node pointing at it.
pub fn document(
    byte_length: usize,
    views: &str,
    accessors: &str,
    primitive: &str,
    nodes: &str,
) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [ {{ "uri": "model.bin", "byteLength": {byte_length} }} ],
  "bufferViews": [ {views} ],
  "accessors": [ {accessors} ],
  "meshes": [ {{ "name": "fixture", "primitives": [ {primitive} ] }} ],
  "nodes": [ {nodes} ]
}}"#
    )
}

/// A VEC3 float accessor over `view` with bounds that cover the unit triangle.
pub fn vec3_accessor(view: usize, byte_offset: usize, count: usize) -> String {
    format!(
        r#"{{ "bufferView": {view}, "byteOffset": {byte_offset}, "componentType": 5126, "count": {count}, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0] }}"#
    )
}

pub fn view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> String {
    match byte_stride {
        Some(stride) => format!(
            r#"{{ "buffer": 0, "byteOffset": {byte_offset}, "byteLength": {byte_length}, "byteStride": {stride} }}"#
        ),
        None => format!(
            r#"{{ "buffer": 0, "byteOffset": {byte_offset}, "byteLength": {byte_length} }}"#
        ),
    }
}

pub const MESH_NODE: &str = r#"{ "mesh": 0 }"#;

/// The single-triangle document: POSITION only, VEC3/FLOAT, count 3, TRIANGLES.
pub fn triangle_fixture() -> Fixture {
    let json = document(
        36,
        &view(0, 36, None),
        &vec3_accessor(0, 0, 3),
        r#"{ "attributes": { "POSITION": 0 }, "mode": 4 }"#,
        MESH_NODE,
    );
    write_fixture(&json, Some(&f32_bytes(&TRIANGLE_POSITIONS)))
}
