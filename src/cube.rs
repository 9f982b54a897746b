//! Mapping of field values between AMR grid patches and uniform data cubes.
//!
//! A patch and a cube live in the same real coordinate space but generally
//! have different cell extents and offsets. The mapping visits every
//! (patch cell, cube cell) pair whose spatial extents overlap and combines
//! the two values with a caller-selected rule.

use crate::geometry::{
    Dim3::{self, X, Y, Z},
    Vec3,
};
use crate::num::{fdt, fgr};
use ndarray::prelude::*;
use std::{io, ops::Range};

/// Rule for combining the values of an overlapping (patch cell, cube cell) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineRule {
    /// Overwrite the patch cell value with the cube cell value.
    Refine,
    /// Overwrite the cube cell value with the patch cell value.
    Replace,
}

impl CombineRule {
    fn apply(self, cube_value: &mut fdt, patch_value: &mut fdt) {
        match self {
            Self::Refine => *patch_value = *cube_value,
            Self::Replace => *cube_value = *patch_value,
        }
    }
}

/// A rectangular patch of an AMR grid, with uniform cell extents per axis
/// and a child mask flagging which cells are leaves.
pub struct GridPatch<'a> {
    left_edge: Vec3<fgr>,
    cell_extents: Vec3<fgr>,
    data: ArrayViewMut3<'a, fdt>,
    child_mask: ArrayView3<'a, i32>,
}

impl<'a> GridPatch<'a> {
    /// Creates a new grid patch from the given edge, cell extents, data
    /// values and child mask.
    ///
    /// A nonzero child mask entry marks the cell as a leaf (not covered by a
    /// finer child grid). Fails if the child mask shape differs from the data
    /// shape.
    pub fn new(
        left_edge: Vec3<fgr>,
        cell_extents: Vec3<fgr>,
        data: ArrayViewMut3<'a, fdt>,
        child_mask: ArrayView3<'a, i32>,
    ) -> io::Result<Self> {
        if child_mask.dim() != data.dim() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Patch data and child mask must have the same shape ({:?} != {:?})",
                    data.dim(),
                    child_mask.dim()
                ),
            ));
        }
        Ok(Self {
            left_edge,
            cell_extents,
            data,
            child_mask,
        })
    }

    fn shape(&self, dim: Dim3) -> usize {
        self.data.shape()[dim.num()]
    }

    /// Returns the lower real-space boundary of the given cell along the
    /// given dimension.
    fn cell_lower_boundary(&self, dim: Dim3, cell_idx: usize) -> fgr {
        self.left_edge[dim] + self.cell_extents[dim] * (cell_idx as fgr)
    }
}

/// A uniform output grid that AMR grid patches are resampled onto.
pub struct DataCube<'a> {
    left_edge: Vec3<fgr>,
    right_edge: Vec3<fgr>,
    cell_extents: Vec3<fgr>,
    data: ArrayViewMut3<'a, fdt>,
}

impl<'a> DataCube<'a> {
    /// Creates a new data cube from the given edges, cell extents and data
    /// values.
    ///
    /// Fails if any cell extent is not positive or if the right edge lies
    /// below the left edge along any dimension.
    pub fn new(
        left_edge: Vec3<fgr>,
        right_edge: Vec3<fgr>,
        cell_extents: Vec3<fgr>,
        data: ArrayViewMut3<'a, fdt>,
    ) -> io::Result<Self> {
        for dim in Dim3::slice() {
            if cell_extents[dim] <= 0.0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Cube cell extent must be positive (got {} along {})",
                        cell_extents[dim], dim
                    ),
                ));
            }
            if right_edge[dim] < left_edge[dim] {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Cube right edge lies below left edge along {} ({} < {})",
                        dim, right_edge[dim], left_edge[dim]
                    ),
                ));
            }
        }
        Ok(Self {
            left_edge,
            right_edge,
            cell_extents,
            data,
        })
    }

    fn shape(&self, dim: Dim3) -> usize {
        self.data.shape()[dim.num()]
    }

    /// Returns the range of cube cell indices covered by the patch cell
    /// extent `[cell_lower, cell_upper]` along the given dimension, or `None`
    /// if the extent lies outside the cube.
    fn overlapped_cells(&self, dim: Dim3, cell_lower: fgr, cell_upper: fgr) -> Option<Range<usize>> {
        if cell_lower > self.right_edge[dim] || cell_upper < self.left_edge[dim] {
            return None;
        }
        let start = fgr::max(
            fgr::floor((cell_lower - self.left_edge[dim]) / self.cell_extents[dim]),
            0.0,
        ) as usize;
        let end = fgr::min(
            fgr::ceil((cell_upper - self.left_edge[dim]) / self.cell_extents[dim]),
            self.shape(dim) as fgr,
        ) as usize;
        Some(start..end)
    }
}

/// Maps every leaf cell of the patch overlapping the cube onto the cube cells
/// it covers, combining each visited (patch cell, cube cell) pair of values
/// with the given rule.
///
/// With [`CombineRule::Replace`] the patch value is painted onto the covered
/// cube cells; with [`CombineRule::Refine`] the cube value is pulled down
/// into the patch cell. Writes are unconditional overwrites, and patch cells
/// are visited in nested `(x, y, z)` order, so overlapping writes into the
/// same target cell follow last-write-wins order. Cells with a zero child
/// mask are skipped unless `include_non_leaf` is set, since non-leaf cells
/// are expected to be represented by their refined children.
///
/// # Returns
///
/// The total number of (patch cell, cube cell) pairs visited.
pub fn map_patch_onto_cube(
    patch: &mut GridPatch,
    cube: &mut DataCube,
    include_non_leaf: bool,
    rule: CombineRule,
) -> usize {
    let mut number_visited = 0;

    for xg in 0..patch.shape(X) {
        let x_cells = match cube.overlapped_cells(
            X,
            patch.cell_lower_boundary(X, xg),
            patch.cell_lower_boundary(X, xg + 1),
        ) {
            Some(cells) => cells,
            None => continue,
        };
        for yg in 0..patch.shape(Y) {
            let y_cells = match cube.overlapped_cells(
                Y,
                patch.cell_lower_boundary(Y, yg),
                patch.cell_lower_boundary(Y, yg + 1),
            ) {
                Some(cells) => cells,
                None => continue,
            };
            for zg in 0..patch.shape(Z) {
                if !include_non_leaf && patch.child_mask[[xg, yg, zg]] == 0 {
                    continue;
                }
                let z_cells = match cube.overlapped_cells(
                    Z,
                    patch.cell_lower_boundary(Z, zg),
                    patch.cell_lower_boundary(Z, zg + 1),
                ) {
                    Some(cells) => cells,
                    None => continue,
                };
                for xc in x_cells.clone() {
                    for yc in y_cells.clone() {
                        for zc in z_cells.clone() {
                            rule.apply(
                                &mut cube.data[[xc, yc, zc]],
                                &mut patch.data[[xg, yg, zg]],
                            );
                            number_visited += 1;
                        }
                    }
                }
            }
        }
    }

    number_visited
}

#[cfg(test)]
mod tests {

    use super::*;

    fn full_leaf_mask(shape: (usize, usize, usize)) -> Array3<i32> {
        Array3::ones(shape)
    }

    #[test]
    fn replace_paints_patch_values_onto_coincident_cube() {
        let mut patch_values =
            Array3::from_shape_fn((2, 2, 2), |(i, j, k)| (i * 4 + j * 2 + k) as fdt);
        let patch_mask = full_leaf_mask((2, 2, 2));
        let mut cube_values = Array3::zeros((2, 2, 2));

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::zero(),
            Vec3::equal_components(2.0),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited =
            map_patch_onto_cube(&mut patch, &mut cube, false, CombineRule::Replace);
        assert_eq!(number_visited, 8);
        assert_eq!(cube_values, patch_values);
    }

    #[test]
    fn refine_pulls_cube_values_down_onto_patch() {
        let mut patch_values = Array3::zeros((2, 2, 2));
        let patch_mask = full_leaf_mask((2, 2, 2));
        let mut cube_values =
            Array3::from_shape_fn((2, 2, 2), |(i, j, k)| (i * 4 + j * 2 + k) as fdt + 1.0);

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::zero(),
            Vec3::equal_components(2.0),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited = map_patch_onto_cube(&mut patch, &mut cube, false, CombineRule::Refine);
        assert_eq!(number_visited, 8);
        assert_eq!(patch_values, cube_values);
    }

    #[test]
    fn non_leaf_cells_are_skipped_by_default() {
        let mut patch_values = Array3::from_elem((1, 1, 2), 3.0);
        let mut patch_mask = Array3::ones((1, 1, 2));
        patch_mask[[0, 0, 1]] = 0;
        let mut cube_values = Array3::zeros((1, 1, 2));

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::zero(),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited =
            map_patch_onto_cube(&mut patch, &mut cube, false, CombineRule::Replace);
        assert_eq!(number_visited, 1);
        assert_eq!(cube_values[[0, 0, 0]], 3.0);
        assert_eq!(cube_values[[0, 0, 1]], 0.0);
    }

    #[test]
    fn non_leaf_cells_are_included_on_request() {
        let mut patch_values = Array3::from_elem((1, 1, 2), 3.0);
        let mut patch_mask = Array3::zeros((1, 1, 2));
        let mut cube_values = Array3::zeros((1, 1, 2));

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::zero(),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited = map_patch_onto_cube(&mut patch, &mut cube, true, CombineRule::Replace);
        assert_eq!(number_visited, 2);
        assert_eq!(cube_values[[0, 0, 1]], 3.0);
    }

    #[test]
    fn patch_cells_outside_cube_are_skipped() {
        // The patch spans x in [0, 2] but the cube only x in [1, 2], so the
        // first patch cell grazes the cube boundary and covers no cube cell.
        let mut patch_values = Array3::from_shape_fn((2, 1, 1), |(i, _, _)| (i + 1) as fdt);
        let patch_mask = Array3::ones((2, 1, 1));
        let mut cube_values = Array3::zeros((1, 1, 1));

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited =
            map_patch_onto_cube(&mut patch, &mut cube, false, CombineRule::Replace);
        assert_eq!(number_visited, 1);
        assert_eq!(cube_values[[0, 0, 0]], 2.0);
    }

    #[test]
    fn overlapping_writes_follow_last_write_wins_order() {
        // Two fine patch cells cover the single coarse cube cell; the cell
        // visited last leaves its value.
        let mut patch_values = Array3::from_shape_fn((2, 1, 1), |(i, _, _)| (i + 1) as fdt);
        let patch_mask = Array3::ones((2, 1, 1));
        let mut cube_values = Array3::zeros((1, 1, 1));

        let mut patch = GridPatch::new(
            Vec3::zero(),
            Vec3::new(1.0, 2.0, 2.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .unwrap();
        let mut cube = DataCube::new(
            Vec3::zero(),
            Vec3::equal_components(2.0),
            Vec3::equal_components(2.0),
            cube_values.view_mut(),
        )
        .unwrap();

        let number_visited =
            map_patch_onto_cube(&mut patch, &mut cube, false, CombineRule::Replace);
        assert_eq!(number_visited, 2);
        assert_eq!(cube_values[[0, 0, 0]], 2.0);
    }

    #[test]
    fn mismatched_child_mask_shape_is_rejected() {
        let mut patch_values = Array3::<fdt>::zeros((2, 2, 2));
        let patch_mask = Array3::<i32>::ones((2, 2, 1));
        assert!(GridPatch::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            patch_values.view_mut(),
            patch_mask.view(),
        )
        .is_err());
    }

    #[test]
    fn degenerate_cube_geometry_is_rejected() {
        let mut cube_values = Array3::<fdt>::zeros((1, 1, 1));
        assert!(DataCube::new(
            Vec3::zero(),
            Vec3::equal_components(1.0),
            Vec3::new(1.0, 0.0, 1.0),
            cube_values.view_mut(),
        )
        .is_err());

        let mut cube_values = Array3::<fdt>::zeros((1, 1, 1));
        assert!(DataCube::new(
            Vec3::equal_components(1.0),
            Vec3::zero(),
            Vec3::equal_components(1.0),
            cube_values.view_mut(),
        )
        .is_err());
    }
}
