//! Interpolation of tabulated functions on log-uniform axes.
//!
//! The lookup axis is assumed strictly positive and uniformly spaced in
//! base-10 logarithm, so the rows bracketing a query can be found with direct
//! index arithmetic instead of a binary search. Non-positive or
//! non-monotonic axes and queries produce undefined interpolation results.

use crate::num::BFloat;
use ndarray::prelude::*;
use rayon::prelude::*;
use std::io;

/// Linearly interpolates the requested columns of the tabulated function at
/// every query value, writing the results into the given output buffer.
///
/// The interpolation is linear in the base-10 logarithm of the axis. Queries
/// outside the axis domain are extrapolated with the nearest table interval:
/// the bracketing rows are clamped so that the lower row is never below the
/// first axis point, and queries above the axis maximum reuse the last
/// interval.
///
/// Every output entry is written exactly once, in `(query, column)` order
/// matching the `desired` and `columns` arrays. Queries are processed in
/// parallel. Column indices are not range-checked against the table; an
/// out-of-range index makes the table access panic.
///
/// # Errors
///
/// Fails if the axis has fewer than two points or is degenerate (zero range
/// in log space), if the table row count differs from the axis length, or if
/// the output shape does not match the query and column counts.
pub fn interpolate_log_table<F: BFloat>(
    axis: &[F],
    table: ArrayView2<F>,
    desired: &[F],
    columns: &[i32],
    mut output: ArrayViewMut2<F>,
) -> io::Result<()> {
    let number_of_axis_points = axis.len();
    if number_of_axis_points < 2 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Interpolation axis must have at least two points (got {})",
                number_of_axis_points
            ),
        ));
    }
    if table.nrows() != number_of_axis_points {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Axis and table rows must have the same length ({} != {})",
                number_of_axis_points,
                table.nrows()
            ),
        ));
    }
    if output.nrows() != desired.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Number of queries must match number of rows in output buffer ({} != {})",
                desired.len(),
                output.nrows()
            ),
        ));
    }
    if output.ncols() != columns.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Number of columns requested must match number of columns in output buffer ({} != {})",
                columns.len(),
                output.ncols()
            ),
        ));
    }

    let log_axis_start = axis[0].log10();
    let log_axis_end = axis[number_of_axis_points - 1].log10();
    if log_axis_end == log_axis_start {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Interpolation axis is degenerate (zero range in log space)",
        ));
    }
    let log_spacing = (log_axis_end - log_axis_start)
        / F::from_usize(number_of_axis_points - 1).expect("Conversion failed");

    let max_upper_row = F::from_usize(number_of_axis_points - 1).expect("Conversion failed");

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(desired.par_iter())
        .for_each(|(mut output_row, &desired_value)| {
            let log_desired = desired_value.log10();

            // Truncation toward zero reproduces the original lookup, while
            // the lower clamp keeps the lower bracket row in range for
            // queries far below the axis minimum.
            let upper_row = (((log_desired - log_axis_start) / log_spacing).trunc() + F::one())
                .max(F::one())
                .min(max_upper_row)
                .to_usize()
                .expect("Conversion failed");

            let log_lower =
                log_axis_start + F::from_usize(upper_row - 1).expect("Conversion failed") * log_spacing;
            let log_upper =
                log_axis_start + F::from_usize(upper_row).expect("Conversion failed") * log_spacing;
            let bracket_extent = log_upper - log_lower;

            for (output_value, &column) in output_row.iter_mut().zip(columns) {
                let lower_value = table[[upper_row - 1, column as usize]];
                let upper_value = table[[upper_row, column as usize]];
                *output_value = lower_value
                    + (log_desired - log_lower) * (upper_value - lower_value) / bracket_extent;
            }
        });

    Ok(())
}
