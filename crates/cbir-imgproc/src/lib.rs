#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// image cropping module.
pub mod crop;

/// image filtering module.
pub mod filter;

/// compute image histogram module.
pub mod histogram;

/// module containing parallization utilities.
pub mod parallel;
