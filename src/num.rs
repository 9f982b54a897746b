//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat: Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug {}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Floating-point type of field values and accumulated quantities.
#[allow(non_camel_case_types)]
pub type fdt = f64;

/// Floating-point type of grid geometry.
#[allow(non_camel_case_types)]
pub type fgr = f64;

/// Integer type of discrete grid-cell coordinates and point masks.
#[allow(non_camel_case_types)]
pub type igr = i64;
