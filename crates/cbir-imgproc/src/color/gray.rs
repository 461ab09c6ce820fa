use crate::parallel;
use cbir_image::{Image, ImageError};

/// ITU-R BT.601 luma weights of the R, G and B channels.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Convert an RGB image to single channel luma, `0.299 R + 0.587 G + 0.114 B`.
///
/// The output keeps the range of the input.
///
/// Precondition: the input and output images must have the same size.
pub fn gray_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let [wr, wg, wb] = LUMA_WEIGHTS;
    parallel::par_iter_rows(src, dst, |rgb, luma| {
        luma[0] = wr * rgb[0] + wg * rgb[1] + wb * rgb[2];
    });

    Ok(())
}
