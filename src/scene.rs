//! The demo scene: entity collections, the camera and the frame batch.
//!
//! `Scene::update` is the per-tick step: apply input to the camera, advance every
//! entity by the elapsed time and repack all model matrices into the
//! [`FrameBatch`] the renderer consumes.

use winit::keyboard::KeyCode;

use crate::{
    camera::Camera,
    data_structures::{
        batch::{CapacityError, DEFAULT_TRANSFORM_CAPACITY, FrameBatch, ObjectKind, TransformPacker},
        entity::Entity,
    },
    input::InputState,
};

/// Layout and tuning of the demo scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Spinning triangles in a row along Y.
    pub triangles: usize,
    /// Side length of the quad floor grid.
    pub quad_grid: usize,
    /// Spinning cubes in a row along Y.
    pub cubes: usize,
    pub camera_position: [f32; 3],
    /// Degrees.
    pub camera_yaw: f32,
    /// Degrees.
    pub camera_pitch: f32,
    /// World units per second.
    pub camera_speed: f32,
    /// Degrees per pixel of pointer motion.
    pub camera_sensitivity: f32,
    /// Matrices the transform buffer can hold.
    pub capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            triangles: 20,
            quad_grid: 20,
            cubes: 5,
            camera_position: [-5.0, 0.0, 0.5],
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            camera_speed: 1.8,
            camera_sensitivity: 0.1,
            capacity: DEFAULT_TRANSFORM_CAPACITY,
        }
    }
}

pub struct Scene {
    groups: Vec<(ObjectKind, Vec<Entity>)>,
    camera: Camera,
    speed: f32,
    sensitivity: f32,
    packer: TransformPacker,
    batch: FrameBatch,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        let triangles = (0..config.triangles)
            .map(|i| {
                let y = (i as f32 / config.triangles as f32) * 5.0 - 2.0;
                Entity::new([0.0, y, 0.0], 0.0, 60.0)
            })
            .collect();

        let half = config.quad_grid as f32 / 2.0;
        let quads = (0..config.quad_grid)
            .flat_map(|x| (0..config.quad_grid).map(move |y| (x, y)))
            .map(|(x, y)| Entity::fixed([x as f32 - half + 0.5, y as f32 - half + 0.5, -1.0]))
            .collect();

        let cubes = (0..config.cubes)
            .map(|i| Entity::new([4.0, i as f32 * 3.0 - 6.0, 0.5], 0.0, 100.0))
            .collect();

        let groups = vec![
            (ObjectKind::Triangle, triangles),
            (ObjectKind::Quad, quads),
            (ObjectKind::Cube, cubes),
        ];
        Self::from_groups(groups, config)
    }

    /// Build a scene from explicit entity groups. Kinds are packed in declared order.
    pub fn from_groups(mut groups: Vec<(ObjectKind, Vec<Entity>)>, config: &SceneConfig) -> Self {
        groups.sort_by_key(|(kind, _)| *kind);
        log::info!(
            "Scene with {} entities (capacity {})",
            groups.iter().map(|(_, entities)| entities.len()).sum::<usize>(),
            config.capacity
        );
        Self {
            groups,
            camera: Camera::new(config.camera_position, config.camera_yaw, config.camera_pitch),
            speed: config.camera_speed,
            sensitivity: config.camera_sensitivity,
            packer: TransformPacker::new(config.capacity),
            batch: FrameBatch::new(),
        }
    }

    /// Advance the scene by `dt` seconds and repack the transform buffer.
    pub fn update(&mut self, dt: f32, input: &mut InputState) -> Result<&FrameBatch, CapacityError> {
        let (dx, dy) = input.take_pointer_delta();
        if dx != 0.0 || dy != 0.0 {
            self.camera.rotate(dx as f32, dy as f32, self.sensitivity);
        }

        let forwards = axis(input, KeyCode::KeyW, KeyCode::KeyS);
        let right = axis(input, KeyCode::KeyD, KeyCode::KeyA);
        // Move along last tick's basis, then rebuild it.
        self.camera
            .translate(right * self.speed * dt, forwards * self.speed * dt);

        for (_, entities) in self.groups.iter_mut() {
            entities.iter_mut().for_each(|entity| entity.update(dt));
        }
        self.camera.update();

        self.packer.pack(
            &mut self.batch,
            self.groups
                .iter()
                .map(|(kind, entities)| (*kind, entities.as_slice())),
        )?;
        Ok(&self.batch)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn batch(&self) -> &FrameBatch {
        &self.batch
    }

    pub fn entities(&self, kind: ObjectKind) -> &[Entity] {
        self.groups
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, entities)| entities.as_slice())
            .unwrap_or(&[])
    }

    pub fn capacity(&self) -> usize {
        self.packer.capacity()
    }
}

/// +1 while `positive` is held, -1 while only `negative` is held.
fn axis(input: &InputState, positive: KeyCode, negative: KeyCode) -> f32 {
    if input.is_key_down(positive) {
        1.0
    } else if input.is_key_down(negative) {
        -1.0
    } else {
        0.0
    }
}
