//! Per-frame transform batching.
//!
//! Every entity's model matrix is packed into one flat buffer, kind-major: all
//! triangles, then all quads, then all cubes. The renderer binds that buffer as
//! a read-only storage buffer and issues one instanced draw per kind whose
//! `first_instance` points at the kind's slice. [`FrameBatch`] carries both the
//! matrices and the ranges, so the packer and the renderer cannot disagree on
//! the layout.

use crate::data_structures::entity::Entity;

/// Number of matrices the transform storage buffer holds unless configured otherwise.
pub const DEFAULT_TRANSFORM_CAPACITY: usize = 1024;

/// One column-major 4x4 matrix as the shader reads it.
pub type RawMatrix = [[f32; 4]; 4];

/// The kinds of instanced objects, in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Triangle,
    Quad,
    Cube,
}

impl ObjectKind {
    /// All kinds in their declared order.
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Triangle, ObjectKind::Quad, ObjectKind::Cube];

    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Triangle => "triangle",
            ObjectKind::Quad => "quad",
            ObjectKind::Cube => "cube",
        }
    }
}

/// A contiguous slice of the transform buffer belonging to one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchRange {
    pub kind: ObjectKind,
    pub count: u32,
    /// Sum of the counts of every range before this one.
    pub first_instance: u32,
}

impl BatchRange {
    pub fn instances(&self) -> std::ops::Range<u32> {
        self.first_instance..self.first_instance + self.count
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("transform buffer overflow: {requested} entities requested, capacity is {capacity}")]
pub struct CapacityError {
    pub requested: usize,
    pub capacity: usize,
}

/// The packed output of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameBatch {
    matrices: Vec<RawMatrix>,
    ranges: Vec<BatchRange>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrices(&self) -> &[RawMatrix] {
        &self.matrices
    }

    pub fn ranges(&self) -> &[BatchRange] {
        &self.ranges
    }

    /// `(kind, count)` in buffer order, zero-count kinds included.
    pub fn counts(&self) -> impl Iterator<Item = (ObjectKind, u32)> + '_ {
        self.ranges.iter().map(|range| (range.kind, range.count))
    }

    pub fn range(&self, kind: ObjectKind) -> Option<&BatchRange> {
        self.ranges.iter().find(|range| range.kind == kind)
    }

    /// The matrices of one kind, read back at its `first_instance` offset.
    pub fn slice(&self, kind: ObjectKind) -> Option<&[RawMatrix]> {
        self.range(kind).map(|range| {
            let start = range.first_instance as usize;
            &self.matrices[start..start + range.count as usize]
        })
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    fn clear(&mut self) {
        self.matrices.clear();
        self.ranges.clear();
    }
}

/// Writes entity groups into a [`FrameBatch`] with a hard capacity.
#[derive(Clone, Copy, Debug)]
pub struct TransformPacker {
    capacity: usize,
}

impl TransformPacker {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Repack `batch` from `groups`, which must already be in draw order.
    ///
    /// Fails before touching `batch` when the groups hold more entities than
    /// the buffer can take.
    pub fn pack<'e, I>(&self, batch: &mut FrameBatch, groups: I) -> Result<(), CapacityError>
    where
        I: IntoIterator<Item = (ObjectKind, &'e [Entity])>,
    {
        let groups: Vec<_> = groups.into_iter().collect();
        let requested: usize = groups.iter().map(|(_, entities)| entities.len()).sum();
        if requested > self.capacity {
            return Err(CapacityError {
                requested,
                capacity: self.capacity,
            });
        }

        batch.clear();
        for (kind, entities) in groups {
            let first_instance = batch.matrices.len() as u32;
            batch
                .matrices
                .extend(entities.iter().map(|entity| -> RawMatrix { (*entity.model()).into() }));
            batch.ranges.push(BatchRange {
                kind,
                count: entities.len() as u32,
                first_instance,
            });
        }
        Ok(())
    }
}

impl Default for TransformPacker {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFORM_CAPACITY)
    }
}
