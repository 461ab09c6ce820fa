/// Kernels used by the filtering operations.
pub mod kernels;

mod ops;
pub use ops::{magnitude, orientation_degrees, spatial_gradient};
