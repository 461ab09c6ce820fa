#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use cbir_image as image;

#[doc(inline)]
pub use cbir_imgproc as imgproc;

#[doc(inline)]
pub use cbir_io as io;

#[doc(inline)]
pub use cbir_features as features;
