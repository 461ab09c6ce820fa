use cbir_image::{Image, ImageError};

use crate::parallel;

/// Map a value to a uniform bin over `[0, range)`, clamped to `[0, num_bins - 1]`.
///
/// PRECONDITION: `num_bins > 0` and `range > 0`.
///
/// # Example
///
/// ```
/// use cbir_imgproc::histogram::bin_index;
///
/// assert_eq!(bin_index(0.0, 16, 360.0), 0);
/// assert_eq!(bin_index(359.9, 16, 360.0), 15);
/// assert_eq!(bin_index(400.0, 16, 360.0), 15);
/// assert_eq!(bin_index(-1.0, 16, 360.0), 0);
/// ```
#[inline]
pub fn bin_index(value: f32, num_bins: usize, range: f32) -> usize {
    let bin = (value * num_bins as f32 / range).floor();
    if bin <= 0.0 {
        0
    } else {
        (bin as usize).min(num_bins - 1)
    }
}

fn check_bins(num_bins: usize, max: usize) -> Result<(), ImageError> {
    if num_bins == 0 || num_bins > max {
        return Err(ImageError::InvalidHistogramBins(num_bins));
    }
    Ok(())
}

/// Compute the joint 3D color histogram of an 8-bit RGB image.
///
/// Each channel is split into `num_bins` uniform buckets over [0, 256); the
/// bin of a pixel is `r_bin * num_bins² + g_bin * num_bins + b_bin`.
///
/// # Errors
///
/// Returns an error if `num_bins` is zero or larger than 256.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::histogram::rgb_histogram;
///
/// let image = Image::<u8, 3>::new(
///     ImageSize { width: 2, height: 1 },
///     vec![0, 0, 0, 255, 255, 255],
/// ).unwrap();
///
/// let hist = rgb_histogram(&image, 2).unwrap();
/// assert_eq!(hist, vec![1, 0, 0, 0, 0, 0, 0, 1]);
/// ```
pub fn rgb_histogram(src: &Image<u8, 3>, num_bins: usize) -> Result<Vec<u64>, ImageError> {
    check_bins(num_bins, 256)?;

    let mut bin_lut = [0usize; 256];
    for (i, bin) in bin_lut.iter_mut().enumerate() {
        *bin = (i * num_bins) >> 8;
    }

    let total_bins = num_bins * num_bins * num_bins;
    Ok(parallel::par_fold_bins(src, total_bins, |px| {
        let r = bin_lut[px[0] as usize];
        let g = bin_lut[px[1] as usize];
        let b = bin_lut[px[2] as usize];
        Some(r * num_bins * num_bins + g * num_bins + b)
    }))
}

/// Compute the joint 2D histogram of two channels of a floating point image.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `channels` - The two channel indices to bin, `[a, b]`.
/// * `num_bins` - The number of bins for each channel.
/// * `ranges` - The exclusive upper bound of each channel's values.
///
/// The bin of a pixel is `a_bin * num_bins[1] + b_bin`.
///
/// # Errors
///
/// Returns an error if a channel index is out of bounds or a bin count is zero.
pub fn histogram_2d<const C: usize>(
    src: &Image<f32, C>,
    channels: [usize; 2],
    num_bins: [usize; 2],
    ranges: [f32; 2],
) -> Result<Vec<u64>, ImageError> {
    for &ch in channels.iter() {
        if ch >= C {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, C));
        }
    }
    check_bins(num_bins[0], usize::MAX)?;
    check_bins(num_bins[1], usize::MAX)?;

    let [ca, cb] = channels;
    let [na, nb] = num_bins;
    Ok(parallel::par_fold_bins(src, na * nb, |px| {
        let a = bin_index(px[ca], na, ranges[0]);
        let b = bin_index(px[cb], nb, ranges[1]);
        Some(a * nb + b)
    }))
}

/// Compute the histogram of a single channel floating point image over `[0, range)`.
///
/// # Errors
///
/// Returns an error if `num_bins` is zero.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::histogram::histogram_1d;
///
/// let image = Image::<f32, 1>::new(
///     ImageSize { width: 4, height: 1 },
///     vec![0.0, 0.4, 0.6, 1.0],
/// ).unwrap();
///
/// assert_eq!(histogram_1d(&image, 2, 1.0).unwrap(), vec![2, 2]);
/// ```
pub fn histogram_1d(
    src: &Image<f32, 1>,
    num_bins: usize,
    range: f32,
) -> Result<Vec<u64>, ImageError> {
    check_bins(num_bins, usize::MAX)?;
    Ok(parallel::par_fold_bins(src, num_bins, |px| {
        Some(bin_index(px[0], num_bins, range))
    }))
}

/// Normalize raw bin counts by the number of pixels.
///
/// The divisor is `max(total, 1)` so a zero-area image yields an all-zero histogram.
pub fn normalize_counts(counts: &[u64], total: usize) -> Vec<f64> {
    let total = total.max(1) as f64;
    counts.iter().map(|&c| c as f64 / total).collect()
}
