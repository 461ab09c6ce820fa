mod chromaticity;
mod gray;
mod hsv;

pub use chromaticity::rg_from_rgb;
pub use gray::{gray_from_rgb, LUMA_WEIGHTS};
pub use hsv::hue_saturation_from_rgb;
