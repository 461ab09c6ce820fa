use crate::parallel;
use cbir_image::{Image, ImageError};

/// Compute the hue and saturation of every pixel of an 8-bit range RGB image.
///
/// The output holds two channels:
///
/// * hue in degrees, in [0, 360). Achromatic pixels (gray, black, white) have hue 0.
/// * saturation `(max - min) / max` scaled to [0, 255]. Black has saturation 0.
///
/// The value channel of HSV is not computed.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::color::hue_saturation_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize { width: 2, height: 1 },
///     vec![0.0, 255.0, 0.0, 100.0, 100.0, 100.0],
/// )
/// .unwrap();
///
/// let mut hs = Image::<f32, 2>::from_size_val(image.size(), 0.0).unwrap();
/// hue_saturation_from_rgb(&image, &mut hs).unwrap();
///
/// assert_eq!(hs.as_slice(), &[120.0, 255.0, 0.0, 0.0]);
/// ```
pub fn hue_saturation_from_rgb(
    src: &Image<f32, 3>,
    dst: &mut Image<f32, 2>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |rgb, hs| {
        let [r, g, b] = [rgb[0], rgb[1], rgb[2]];
        let hi = r.max(g).max(b);
        let chroma = hi - r.min(g).min(b);

        // sector of the color hexagon, in units of 60 degrees
        let sector = if chroma <= 0.0 {
            0.0
        } else if hi == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if hi == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };

        let hue = 60.0 * sector;
        hs[0] = if hue >= 360.0 { 0.0 } else { hue };
        hs[1] = if hi > 0.0 { 255.0 * chroma / hi } else { 0.0 };
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cbir_image::{Image, ImageError, ImageSize};

    fn hue_saturation(rgb: [f32; 3]) -> Result<[f32; 2], ImageError> {
        let image = Image::<f32, 3>::new(ImageSize { width: 1, height: 1 }, rgb.to_vec())?;
        let mut hs = Image::<f32, 2>::from_size_val(image.size(), 0.0)?;
        super::hue_saturation_from_rgb(&image, &mut hs)?;
        Ok([hs.as_slice()[0], hs.as_slice()[1]])
    }

    #[test]
    fn primaries_and_secondaries() -> Result<(), ImageError> {
        let cases = [
            ([255.0, 0.0, 0.0], [0.0, 255.0]),
            ([255.0, 255.0, 0.0], [60.0, 255.0]),
            ([0.0, 0.0, 255.0], [240.0, 255.0]),
            ([255.0, 0.0, 255.0], [300.0, 255.0]),
            ([200.0, 100.0, 100.0], [0.0, 127.5]),
            ([0.0, 0.0, 0.0], [0.0, 0.0]),
            ([255.0, 255.0, 255.0], [0.0, 0.0]),
        ];
        for (rgb, expected) in cases {
            let hs = hue_saturation(rgb)?;
            assert_abs_diff_eq!(hs[0], expected[0], epsilon = 1e-3);
            assert_abs_diff_eq!(hs[1], expected[1], epsilon = 1e-3);
        }
        Ok(())
    }

    #[test]
    fn hue_stays_below_360() -> Result<(), ImageError> {
        // red with a trace of blue sits just below a full turn
        let [h, _] = hue_saturation([255.0, 0.0, 1.0])?;
        assert!((359.0..360.0).contains(&h));
        Ok(())
    }

    #[test]
    fn size_mismatch() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::from_size_val([2, 2].into(), 0.0)?;
        let mut hs = Image::<f32, 2>::from_size_val([2, 1].into(), 0.0)?;
        assert!(super::hue_saturation_from_rgb(&image, &mut hs).is_err());
        Ok(())
    }
}
