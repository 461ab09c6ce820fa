use cbir_image::{Image, ImageError, ImageSize};

/// Copy the rectangle of `size` whose top-left corner is `(x, y)` into a new image.
///
/// # Errors
///
/// Returns [`ImageError::CropOutOfBounds`] if the rectangle does not fit inside `src`.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_imgproc::crop::crop_image;
///
/// #[rustfmt::skip]
/// let image = Image::<u8, 1>::new(ImageSize { width: 3, height: 3 }, vec![
///     1, 2, 3,
///     4, 5, 6,
///     7, 8, 9,
/// ]).unwrap();
///
/// let corner = crop_image(&image, 1, 1, ImageSize { width: 2, height: 2 }).unwrap();
/// assert_eq!(corner.as_slice(), &[5, 6, 8, 9]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    x: usize,
    y: usize,
    size: ImageSize,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy,
{
    if x + size.width > src.cols() || y + size.height > src.rows() {
        return Err(ImageError::CropOutOfBounds(x, y, size.width, size.height));
    }

    let stride = src.cols() * C;
    let mut data = Vec::with_capacity(size.area() * C);
    if size.width > 0 {
        for row in src.as_slice().chunks_exact(stride).skip(y).take(size.height) {
            data.extend_from_slice(&row[x * C..(x + size.width) * C]);
        }
    }

    Image::new(size, data)
}
