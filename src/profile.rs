//! Binning of weighted point samples into 2D profiles.

use crate::num::{fdt, igr};
use ndarray::prelude::*;
use std::io;

/// Accumulates the given weighted samples into binned 2D profile arrays.
///
/// For each sample `n`, `sample_weights[n]` is added into `weight_sums` and
/// `sample_weights[n] * sample_values[n]` into `weighted_value_sums` at bin
/// `(bins_x[n], bins_y[n])`, and the corresponding `touched` entry is set to
/// one. The accumulators are added into rather than overwritten, so callers
/// wanting idempotent results must zero them beforehand.
///
/// Bin indices are not range-checked against the accumulator shape; an
/// out-of-range index makes the array access panic.
///
/// # Errors
///
/// Fails if the sample arrays do not all have the same length as `bins_x`,
/// or if the three accumulators do not all have the same shape.
pub fn bin_2d_profile(
    bins_x: &[igr],
    bins_y: &[igr],
    sample_weights: &[fdt],
    sample_values: &[fdt],
    mut weight_sums: ArrayViewMut2<fdt>,
    mut weighted_value_sums: ArrayViewMut2<fdt>,
    mut touched: ArrayViewMut2<fdt>,
) -> io::Result<()> {
    let number_of_samples = bins_x.len();
    if bins_y.len() != number_of_samples {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "bins_x and bins_y must have the same length ({} != {})",
                number_of_samples,
                bins_y.len()
            ),
        ));
    }
    if sample_weights.len() != number_of_samples {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "bins_x and sample weights must have the same length ({} != {})",
                number_of_samples,
                sample_weights.len()
            ),
        ));
    }
    if sample_values.len() != number_of_samples {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "bins_x and sample values must have the same length ({} != {})",
                number_of_samples,
                sample_values.len()
            ),
        ));
    }
    if weighted_value_sums.dim() != weight_sums.dim() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Weight sum and weighted value sum accumulators must have the same shape ({:?} != {:?})",
                weight_sums.dim(),
                weighted_value_sums.dim()
            ),
        ));
    }
    if touched.dim() != weight_sums.dim() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Weight sum and touched accumulators must have the same shape ({:?} != {:?})",
                weight_sums.dim(),
                touched.dim()
            ),
        ));
    }

    for n in 0..number_of_samples {
        let i = bins_x[n] as usize;
        let j = bins_y[n] as usize;
        weight_sums[[i, j]] += sample_weights[n];
        weighted_value_sums[[i, j]] += sample_weights[n] * sample_values[n];
        touched[[i, j]] = 1.0;
    }

    Ok(())
}
