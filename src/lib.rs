//! instanced-ngin
//!
//! A small cross-platform wgpu renderer. Every frame the model matrices of all
//! scene entities are packed kind by kind into one storage buffer, and each
//! kind is drawn with a single instanced call that starts at its slice of that
//! buffer. glTF documents can be imported next to the instanced objects.
//!
//! High-level modules
//! - `camera`: first-person camera, projection and the frame uniform
//! - `context`: window, surface, device and queue
//! - `data_structures`: entities, frame batches, meshes, materials, textures, models
//! - `flow`: the winit event loop driving update and render
//! - `input`: keyboard and pointer state collected from window events
//! - `pipelines`: instanced and glTF render pipelines
//! - `render`: per-frame upload and draw submission
//! - `resources`: file loading, glTF import and OBJ meshes
//! - `scene`: the demo scene and its per-tick update
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use data_structures::batch::{BatchRange, CapacityError, FrameBatch, ObjectKind, TransformPacker};
pub use flow::{Config, run};
pub use resources::gltf::{GltfLoader, LoadError};
pub use scene::{Scene, SceneConfig};
