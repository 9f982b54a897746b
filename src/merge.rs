//! Merging of point data between grids at different refinement levels.
//!
//! Points carry discrete integer grid-cell coordinates. A source point at
//! coordinate `(x, y)` on a coarser level corresponds to the block of
//! `r x r` cells starting at `(r*x, r*y)` on a level refined by the integer
//! factor `r`, so a single coarse point can merge into several destination
//! points at a refinement boundary.

use crate::num::{fdt, igr};
use std::io;

/// Value of the x-coordinate marking a point as consumed by an earlier merge.
pub const CONSUMED: igr = -1;

/// A set of grid points with parallel coordinate, mask, weight and value arrays.
///
/// All arrays are borrowed from the caller and mutated in place by
/// [`merge_point_sets`]. Points with a negative x-coordinate are treated as
/// consumed and never matched, so negative coordinates are excluded from the
/// legal coordinate domain.
pub struct PointSet<'a> {
    x: &'a mut [igr],
    y: &'a mut [igr],
    mask: &'a mut [igr],
    weight: &'a mut [fdt],
    values: Vec<&'a mut [fdt]>,
}

impl<'a> PointSet<'a> {
    /// Creates a new point set wrapping the given parallel arrays.
    ///
    /// Every array must have the same length as `x`.
    pub fn new(
        x: &'a mut [igr],
        y: &'a mut [igr],
        mask: &'a mut [igr],
        weight: &'a mut [fdt],
        values: Vec<&'a mut [fdt]>,
    ) -> io::Result<Self> {
        let number_of_points = x.len();
        if y.len() != number_of_points {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "x and y arrays must have the same length ({} != {})",
                    number_of_points,
                    y.len()
                ),
            ));
        }
        if mask.len() != number_of_points {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "x and mask arrays must have the same length ({} != {})",
                    number_of_points,
                    mask.len()
                ),
            ));
        }
        if weight.len() != number_of_points {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "x and weight arrays must have the same length ({} != {})",
                    number_of_points,
                    weight.len()
                ),
            ));
        }
        for (array_idx, value_array) in values.iter().enumerate() {
            if value_array.len() != number_of_points {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "x and value array {} must have the same length ({} != {})",
                        array_idx,
                        number_of_points,
                        value_array.len()
                    ),
                ));
            }
        }
        Ok(Self {
            x,
            y,
            mask,
            weight,
            values,
        })
    }

    /// Returns the number of points in the set.
    pub fn number_of_points(&self) -> usize {
        self.x.len()
    }

    /// Returns the number of parallel value arrays carried by the set.
    pub fn number_of_value_arrays(&self) -> usize {
        self.values.len()
    }
}

/// Merges the points of the source set into the destination set at the given
/// refinement factor.
///
/// Each unconsumed source point is expanded into the `r x r` fine coordinates
/// it covers, and every unconsumed destination point with an exactly matching
/// coordinate receives the merge: the destination weight accumulates, the
/// masks combine, and every source value array is added into the
/// corresponding destination value array. The matched source point is marked
/// with [`CONSUMED`] so repeated calls on the same buffers do not match it
/// again. When `refinement_factor` is 1 the merge is one-to-one and the scan
/// stops at the first matching destination point; otherwise all destination
/// points are scanned to support fan-out at refinement boundaries.
///
/// The scan is a brute-force spatial join over all destination points for
/// every fine coordinate.
///
/// # Returns
///
/// The number of (source point, sub-offset, destination point) combinations
/// that matched.
///
/// # Errors
///
/// Fails if either set carries no value arrays, if the sets carry different
/// numbers of value arrays, or if the refinement factor is not positive.
pub fn merge_point_sets(
    source: &mut PointSet,
    destination: &mut PointSet,
    refinement_factor: igr,
) -> io::Result<usize> {
    if refinement_factor < 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Refinement factor must be positive (got {})",
                refinement_factor
            ),
        ));
    }
    let number_of_value_arrays = source.number_of_value_arrays();
    if number_of_value_arrays == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Point sets must carry at least one value array",
        ));
    }
    if destination.number_of_value_arrays() != number_of_value_arrays {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Source and destination must carry the same number of value arrays ({} != {})",
                number_of_value_arrays,
                destination.number_of_value_arrays()
            ),
        ));
    }

    let mut number_found = 0;

    for si in 0..source.number_of_points() {
        if source.x[si] < 0 {
            continue;
        }
        let init_x = refinement_factor * source.x[si];
        let init_y = refinement_factor * source.y[si];

        for x_offset in 0..refinement_factor {
            for y_offset in 0..refinement_factor {
                let fine_x = init_x + x_offset;
                let fine_y = init_y + y_offset;

                for di in 0..destination.number_of_points() {
                    if destination.x[di] < 0 {
                        continue;
                    }
                    if fine_x == destination.x[di] && fine_y == destination.y[di] {
                        number_found += 1;

                        // The addend is the destination's own prior weight, a
                        // quirk inherited from the historical merge rule.
                        destination.weight[di] += destination.weight[di];

                        // Same-level merges combine the masks by logical AND,
                        // mixed-level merges keep the destination mask.
                        destination.mask[di] = ((source.mask[si] != 0
                            && destination.mask[di] != 0)
                            || (refinement_factor != 1 && destination.mask[di] != 0))
                            as igr;

                        source.x[si] = CONSUMED;

                        for (source_values, destination_values) in
                            source.values.iter().zip(destination.values.iter_mut())
                        {
                            destination_values[di] += source_values[si];
                        }

                        if refinement_factor == 1 {
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(number_found)
}
