use rayon::prelude::*;

use cbir_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// Rows are distributed over the rayon thread pool; within a row the pixels
/// are visited sequentially.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Fold every pixel of an image into per-thread histograms and merge them.
///
/// `bin_of` maps a pixel to its bin index, or `None` to leave it uncounted.
/// Indices at or above `num_bins` are clamped into the last bin.
pub fn par_fold_bins<T, const C: usize>(
    src: &Image<T, C>,
    num_bins: usize,
    bin_of: impl Fn(&[T]) -> Option<usize> + Send + Sync,
) -> Vec<u64>
where
    T: Send + Sync,
{
    if num_bins == 0 {
        return Vec::new();
    }

    src.as_slice()
        .par_chunks(4096 * C)
        .fold(
            || vec![0u64; num_bins],
            |mut local, chunk| {
                for px in chunk.chunks_exact(C) {
                    if let Some(idx) = bin_of(px) {
                        local[idx.min(num_bins - 1)] += 1;
                    }
                }
                local
            },
        )
        .reduce(
            || vec![0u64; num_bins],
            |mut a, b| {
                for (i, val) in b.iter().enumerate() {
                    a[i] += val;
                }
                a
            },
        )
}

#[cfg(test)]
mod tests {
    use cbir_image::{Image, ImageError, ImageSize};

    #[test]
    fn par_iter_rows_copies_pixels() -> Result<(), ImageError> {
        let src = Image::<u8, 2>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![1, 2, 3, 4, 5, 6, 7, 8],
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        super::par_iter_rows(&src, &mut dst, |s, d| d[0] = s[0] + s[1]);
        assert_eq!(dst.as_slice(), &[3, 7, 11, 15]);
        Ok(())
    }

    #[test]
    fn par_fold_bins_counts() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![0, 1, 1, 2, 9, 5],
        )?;
        // 9 is clamped into the last bin, 5 is skipped
        let counts = super::par_fold_bins(&src, 3, |px| (px[0] != 5).then_some(px[0] as usize));
        assert_eq!(counts, vec![1, 2, 2]);
        Ok(())
    }
}
