use crate::parallel;
use cbir_image::{Image, ImageError};

/// Chromaticity assigned to pixels whose intensity sum is zero.
const NEUTRAL: f32 = 1.0 / 3.0;

/// Convert an RGB image to rg-chromaticity coordinates.
///
/// Each output pixel holds `r = R / (R + G + B)` and `g = G / (R + G + B)`, both
/// in the range [0, 1]. Black pixels have no defined chromaticity and are
/// mapped to the neutral point (1/3, 1/3).
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::color::rg_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize { width: 1, height: 1 },
///     vec![50.0, 50.0, 100.0],
/// )
/// .unwrap();
///
/// let mut rg = Image::<f32, 2>::from_size_val(image.size(), 0.0).unwrap();
/// rg_from_rgb(&image, &mut rg).unwrap();
///
/// assert_eq!(rg.as_slice(), &[0.25, 0.25]);
/// ```
pub fn rg_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 2>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let sum = src_pixel[0] + src_pixel[1] + src_pixel[2];
        if sum <= 0.0 {
            dst_pixel[0] = NEUTRAL;
            dst_pixel[1] = NEUTRAL;
        } else {
            dst_pixel[0] = src_pixel[0] / sum;
            dst_pixel[1] = src_pixel[1] / sum;
        }
    });

    Ok(())
}
