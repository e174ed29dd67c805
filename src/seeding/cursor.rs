//! Shared raster traversal over the non-zero voxels of a mask.

use crate::{
    geometry::{
        Dim3::{X, Y, Z},
        Idx3, In3D,
    },
    io::Verbosity,
    num::VoxelValue,
    volume::Volume3,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

/// Position of a raster traversal over the voxels of a volume.
///
/// The last index varies fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RasterPosition {
    Unstarted,
    At(Idx3<usize>),
    Finished,
}

impl RasterPosition {
    /// Moves to the next voxel with a non-zero value in the given mask.
    pub fn advance_to_next_nonzero<T: VoxelValue>(&mut self, mask: &Volume3<T>) {
        let shape = mask.shape();
        let mut candidate = match self {
            Self::Finished => return,
            Self::Unstarted => {
                Some(Idx3::origin()).filter(|_| shape[X] > 0 && shape[Y] > 0 && shape[Z] > 0)
            }
            Self::At(indices) => next_in_raster_order(indices, &shape),
        };
        while let Some(indices) = candidate {
            if mask.value(&indices).is_nonzero() {
                *self = Self::At(indices);
                return;
            }
            candidate = next_in_raster_order(&indices, &shape);
        }
        *self = Self::Finished;
    }
}

fn next_in_raster_order(indices: &Idx3<usize>, shape: &In3D<usize>) -> Option<Idx3<usize>> {
    let mut next = indices.clone();
    next[Z] += 1;
    if next[Z] == shape[Z] {
        next[Z] = 0;
        next[Y] += 1;
        if next[Y] == shape[Y] {
            next[Y] = 0;
            next[X] += 1;
            if next[X] == shape[X] {
                return None;
            }
        }
    }
    Some(next)
}

/// Defines how the units of work within a single voxel are enumerated.
pub trait VoxelSubSampler: Send {
    type Sample;

    /// Returns the next unit of work for the current voxel, or `None` when
    /// the voxel is complete.
    fn next_sample(&mut self) -> Option<Self::Sample>;

    /// Prepares for enumerating the units of work of a new voxel.
    fn restart(&mut self);

    /// Returns the number of units of work per voxel, or `None` if it does
    /// not fit in a `usize`.
    fn samples_per_voxel(&self) -> Option<usize>;
}

/// Cursor visiting every unit of work of every non-zero voxel exactly once.
#[derive(Clone, Debug)]
pub struct VoxelCursor<S> {
    position: RasterPosition,
    sub_sampler: S,
    n_visited_voxels: usize,
}

impl<S: VoxelSubSampler> VoxelCursor<S> {
    /// Creates a new cursor positioned before the first voxel.
    pub fn new(sub_sampler: S) -> Self {
        Self {
            position: RasterPosition::Unstarted,
            sub_sampler,
            n_visited_voxels: 0,
        }
    }

    /// Returns the current position of the traversal.
    pub fn position(&self) -> &RasterPosition {
        &self.position
    }

    /// Returns the number of non-zero voxels entered so far.
    pub fn number_of_visited_voxels(&self) -> usize {
        self.n_visited_voxels
    }

    /// Moves to the next unit of work.
    ///
    /// # Returns
    ///
    /// An `Option` which is either:
    ///
    /// - `Some`: Contains the voxel indices and the unit of work within that voxel.
    /// - `None`: Every unit of work has been handed out. All later calls also return `None`.
    pub fn next_unit<T: VoxelValue>(&mut self, mask: &Volume3<T>) -> Option<(Idx3<usize>, S::Sample)> {
        loop {
            match &self.position {
                RasterPosition::Finished => return None,
                RasterPosition::At(indices) => {
                    if let Some(sample) = self.sub_sampler.next_sample() {
                        return Some((indices.clone(), sample));
                    }
                }
                RasterPosition::Unstarted => {}
            }
            self.position.advance_to_next_nonzero(mask);
            if matches!(self.position, RasterPosition::At(_)) {
                self.n_visited_voxels += 1;
                self.sub_sampler.restart();
            }
        }
    }
}

/// A mask together with a cursor that can be advanced concurrently.
///
/// Only advancing the cursor happens under the lock. Once the traversal is
/// complete, callers return without locking.
pub struct SharedVoxelTraversal<T, S> {
    mask: Arc<Volume3<T>>,
    cursor: Mutex<VoxelCursor<S>>,
    is_exhausted: AtomicBool,
    n_nonzero_voxels: usize,
    print_messages: bool,
}

impl<T: VoxelValue, S: VoxelSubSampler> SharedVoxelTraversal<T, S> {
    /// Creates a new traversal over the non-zero voxels of the given mask.
    pub fn new(mask: Arc<Volume3<T>>, sub_sampler: S, verbosity: &Verbosity) -> Self {
        let n_nonzero_voxels = mask.count_nonzero();
        if verbosity.print_messages() {
            println!(
                "Found {} non-zero voxels in {}",
                n_nonzero_voxels,
                mask.name()
            );
        }
        Self {
            mask,
            cursor: Mutex::new(VoxelCursor::new(sub_sampler)),
            is_exhausted: AtomicBool::new(false),
            n_nonzero_voxels,
            print_messages: verbosity.print_messages(),
        }
    }

    /// Returns a reference to the mask.
    pub fn mask(&self) -> &Volume3<T> {
        &self.mask
    }

    /// Returns the number of non-zero voxels in the mask.
    pub fn number_of_nonzero_voxels(&self) -> usize {
        self.n_nonzero_voxels
    }

    /// Returns the total number of units of work the traversal hands out,
    /// or `None` if it does not fit in a `usize`.
    pub fn number_of_units(&self) -> Option<usize> {
        self.cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sub_sampler
            .samples_per_voxel()
            .and_then(|samples_per_voxel| self.n_nonzero_voxels.checked_mul(samples_per_voxel))
    }

    /// Whether every unit of work has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.is_exhausted.load(Ordering::Acquire)
    }

    /// Claims the next unit of work, or returns `None` if the traversal is complete.
    pub fn claim_next_unit(&self) -> Option<(Idx3<usize>, S::Sample)> {
        if self.is_exhausted() {
            return None;
        }
        let (unit, n_visited_voxels) = {
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let unit = cursor.next_unit(&self.mask);
            (unit, cursor.number_of_visited_voxels())
        };
        if unit.is_none()
            && !self.is_exhausted.swap(true, Ordering::AcqRel)
            && self.print_messages
        {
            println!(
                "Finished seeding from all {} non-zero voxels of {}",
                n_visited_voxels,
                self.mask.name()
            );
        }
        unit
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::Array3;

    struct Repeat {
        n: usize,
        emitted: usize,
    }

    impl VoxelSubSampler for Repeat {
        type Sample = usize;

        fn next_sample(&mut self) -> Option<usize> {
            if self.emitted < self.n {
                self.emitted += 1;
                Some(self.emitted - 1)
            } else {
                None
            }
        }

        fn restart(&mut self) {
            self.emitted = 0;
        }

        fn samples_per_voxel(&self) -> Option<usize> {
            Some(self.n)
        }
    }

    fn sparse_mask() -> Volume3<u8> {
        let mut values = Array3::zeros((2, 3, 2));
        values[[0, 0, 1]] = 1;
        values[[0, 2, 0]] = 3;
        values[[1, 1, 1]] = 1;
        Volume3::with_identity_transformation("sparse".to_string(), values)
    }

    #[test]
    fn raster_order_skips_zero_voxels_with_last_index_fastest() {
        let mask = sparse_mask();
        let mut position = RasterPosition::Unstarted;
        let mut visited = Vec::new();
        loop {
            position.advance_to_next_nonzero(&mask);
            match &position {
                RasterPosition::At(indices) => visited.push(indices.clone()),
                _ => break,
            }
        }
        assert_eq!(
            visited,
            vec![Idx3::new(0, 0, 1), Idx3::new(0, 2, 0), Idx3::new(1, 1, 1)]
        );
        assert_eq!(position, RasterPosition::Finished);
    }

    #[test]
    fn cursor_hands_out_every_unit_once_then_stays_finished() {
        let mask = sparse_mask();
        let mut cursor = VoxelCursor::new(Repeat { n: 2, emitted: 0 });
        let mut units = Vec::new();
        while let Some(unit) = cursor.next_unit(&mask) {
            units.push(unit);
        }
        assert_eq!(units.len(), 6);
        assert_eq!(units[0], (Idx3::new(0, 0, 1), 0));
        assert_eq!(units[1], (Idx3::new(0, 0, 1), 1));
        assert_eq!(units[5], (Idx3::new(1, 1, 1), 1));
        assert_eq!(cursor.number_of_visited_voxels(), 3);
        assert!(cursor.next_unit(&mask).is_none());
    }

    #[test]
    fn empty_masks_finish_immediately() {
        let mask = Volume3::with_identity_transformation(
            "empty".to_string(),
            Array3::<u8>::zeros((2, 2, 2)),
        );
        let traversal =
            SharedVoxelTraversal::new(Arc::new(mask), Repeat { n: 1, emitted: 0 }, &Verbosity::Quiet);
        assert_eq!(traversal.number_of_units(), Some(0));
        assert!(traversal.claim_next_unit().is_none());
        assert!(traversal.is_exhausted());
    }

    #[test]
    fn unit_counts_that_overflow_are_not_reported() {
        let mask = Arc::new(sparse_mask());
        let traversal = SharedVoxelTraversal::new(
            Arc::clone(&mask),
            Repeat {
                n: usize::MAX / 2,
                emitted: 0,
            },
            &Verbosity::Quiet,
        );
        assert_eq!(traversal.number_of_units(), None);

        let traversal =
            SharedVoxelTraversal::new(mask, Repeat { n: 7, emitted: 0 }, &Verbosity::Quiet);
        assert_eq!(traversal.number_of_units(), Some(21));
    }

    #[test]
    fn zero_sized_masks_finish_immediately() {
        let mask = Volume3::with_identity_transformation(
            "degenerate".to_string(),
            Array3::<u8>::zeros((2, 0, 2)),
        );
        let mut cursor = VoxelCursor::new(Repeat { n: 1, emitted: 0 });
        assert!(cursor.next_unit(&mask).is_none());
        assert_eq!(cursor.position(), &RasterPosition::Finished);
    }
}
