//! Engine data structures: entities, batches, meshes, materials, textures.
//!
//! - `batch` packs entity transforms into the per-frame storage buffer layout
//! - `entity` is an animated position + rotation with a cached model matrix
//! - `instance` holds TRS transforms used by imported glTF nodes
//! - `material` pairs a texture with its bind group
//! - `mesh` contains the built-in triangle/quad/cube vertex data
//! - `model` holds imported glTF meshes and nodes ready to draw
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod batch;
pub mod entity;
pub mod instance;
pub mod material;
pub mod mesh;
pub mod model;
pub mod texture;
