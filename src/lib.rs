//! The `regrid` crate provides numeric kernels for merging and resampling
//! scalar field data living on adaptive mesh refinement grids.
pub mod geometry;
pub mod num;
pub mod merge;
pub mod profile;
pub mod cube;
pub mod interpolation;
