//! Render pipelines.
//!
//! - `basic` draws the built-in primitives instanced from the transform storage buffer
//! - `gltf` builds and caches pipelines for imported glTF primitives

pub mod basic;
pub mod gltf;
