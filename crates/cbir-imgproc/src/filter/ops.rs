use cbir_image::{Image, ImageError};
use rayon::prelude::*;

use super::kernels;

fn check_same_size<const C1: usize, const C2: usize>(
    a: &Image<f32, C1>,
    b: &Image<f32, C2>,
) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.cols(),
            a.rows(),
            b.cols(),
            b.rows(),
        ));
    }
    Ok(())
}

/// Compute the first order image derivative in both x and y using a Sobel operator.
///
/// The borders are handled with reflect-101 padding so every output pixel,
/// including the outermost ring, is defined.
///
/// # Arguments
///
/// * `src` - The source grayscale image with shape (H, W).
/// * `dx` - The destination horizontal derivative with shape (H, W).
/// * `dy` - The destination vertical derivative with shape (H, W).
/// * `kernel_size` - The size of the Sobel kernel, 3 or 5.
///
/// PRECONDITION: `src`, `dx` and `dy` must have the same shape.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::filter::spatial_gradient;
///
/// // a horizontal ramp has a constant x derivative and no y derivative
/// let src = Image::<f32, 1>::new(
///     ImageSize { width: 4, height: 3 },
///     vec![0., 1., 2., 3., 0., 1., 2., 3., 0., 1., 2., 3.],
/// ).unwrap();
///
/// let mut dx = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
/// let mut dy = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
/// spatial_gradient(&src, &mut dx, &mut dy, 3).unwrap();
///
/// assert_eq!(dx.as_slice()[5], 8.0);
/// assert_eq!(dy.as_slice()[5], 0.0);
/// ```
pub fn spatial_gradient(
    src: &Image<f32, 1>,
    dx: &mut Image<f32, 1>,
    dy: &mut Image<f32, 1>,
    kernel_size: usize,
) -> Result<(), ImageError> {
    check_same_size(src, dx)?;
    check_same_size(src, dy)?;

    let (deriv, smooth, len) = kernels::sobel_kernel_1d(kernel_size)
        .ok_or(ImageError::InvalidKernelSize(kernel_size))?;
    let radius = (len / 2) as isize;

    let (rows, cols) = (src.rows(), src.cols());
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let src_data = src.as_slice();

    dx.as_slice_mut()
        .par_chunks_exact_mut(cols)
        .zip(dy.as_slice_mut().par_chunks_exact_mut(cols))
        .enumerate()
        .for_each(|(y, (dx_row, dy_row))| {
            for x in 0..cols {
                let mut gx = 0.0f32;
                let mut gy = 0.0f32;
                for i in 0..len {
                    let yy = kernels::reflect_101(y as isize + i as isize - radius, rows);
                    let row = &src_data[yy * cols..(yy + 1) * cols];
                    for j in 0..len {
                        let xx = kernels::reflect_101(x as isize + j as isize - radius, cols);
                        let v = row[xx];
                        gx += smooth[i] * deriv[j] * v;
                        gy += deriv[i] * smooth[j] * v;
                    }
                }
                dx_row[x] = gx;
                dy_row[x] = gy;
            }
        });

    Ok(())
}

/// Compute the per-pixel Euclidean norm of two derivative images.
///
/// PRECONDITION: `dx`, `dy` and `dst` must have the same shape.
pub fn magnitude(
    dx: &Image<f32, 1>,
    dy: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    check_same_size(dx, dy)?;
    check_same_size(dx, dst)?;

    dst.as_slice_mut()
        .par_iter_mut()
        .zip(dx.as_slice().par_iter())
        .zip(dy.as_slice().par_iter())
        .for_each(|((dst, &gx), &gy)| {
            *dst = (gx * gx + gy * gy).sqrt();
        });

    Ok(())
}

/// Compute the per-pixel gradient orientation `atan2(dy, dx)` in degrees, in [0, 360).
///
/// A zero gradient has orientation 0.
///
/// PRECONDITION: `dx`, `dy` and `dst` must have the same shape.
pub fn orientation_degrees(
    dx: &Image<f32, 1>,
    dy: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    check_same_size(dx, dy)?;
    check_same_size(dx, dst)?;

    dst.as_slice_mut()
        .par_iter_mut()
        .zip(dx.as_slice().par_iter())
        .zip(dy.as_slice().par_iter())
        .for_each(|((dst, &gx), &gy)| {
            let deg = gy.atan2(gx).to_degrees();
            let deg = if deg < 0.0 { deg + 360.0 } else { deg };
            // -0.0 and rounding at the wrap point can land exactly on 360
            *dst = if deg >= 360.0 { 0.0 } else { deg };
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cbir_image::{Image, ImageError, ImageSize};

    #[test]
    fn gradient_of_constant_is_zero() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 4,
            },
            42.0,
        )?;
        let mut dx = Image::<f32, 1>::from_size_val(src.size(), 1.0)?;
        let mut dy = Image::<f32, 1>::from_size_val(src.size(), 1.0)?;
        super::spatial_gradient(&src, &mut dx, &mut dy, 3)?;
        assert!(dx.as_slice().iter().all(|&v| v == 0.0));
        assert!(dy.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn gradient_vertical_step() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f32, 1>::new(
            ImageSize { width: 3, height: 4 },
            vec![
                0., 0., 0.,
                0., 0., 0.,
                10., 10., 10.,
                10., 10., 10.,
            ],
        )?;
        let mut dx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        let mut dy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        super::spatial_gradient(&src, &mut dx, &mut dy, 3)?;

        assert!(dx.as_slice().iter().all(|&v| v == 0.0));
        // rows 1 and 2 straddle the step: (10 - 0) * (1 + 2 + 1)
        assert_eq!(dy.as_slice()[4], 40.0);
        assert_eq!(dy.as_slice()[7], 40.0);
        // reflect-101 borders mirror the neighbouring row, so the edges see no step
        assert_eq!(dy.as_slice()[1], 0.0);
        assert_eq!(dy.as_slice()[10], 0.0);
        Ok(())
    }

    #[test]
    fn gradient_invalid_kernel() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        let mut dx = src.clone();
        let mut dy = src.clone();
        assert!(super::spatial_gradient(&src, &mut dx, &mut dy, 4).is_err());
        Ok(())
    }

    #[test]
    fn magnitude_and_orientation() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 1,
        };
        let dx = Image::<f32, 1>::new(size, vec![3.0, 0.0, -1.0, 0.0])?;
        let dy = Image::<f32, 1>::new(size, vec![4.0, 2.0, 0.0, -1.0])?;

        let mut mag = Image::<f32, 1>::from_size_val(size, 0.0)?;
        super::magnitude(&dx, &dy, &mut mag)?;
        assert_eq!(mag.as_slice(), &[5.0, 2.0, 1.0, 1.0]);

        let mut ori = Image::<f32, 1>::from_size_val(size, 0.0)?;
        super::orientation_degrees(&dx, &dy, &mut ori)?;
        let expected = [53.130_104, 90.0, 180.0, 270.0];
        for (a, b) in ori.as_slice().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
        Ok(())
    }
}
