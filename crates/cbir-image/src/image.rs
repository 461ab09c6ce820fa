use std::fmt;

use crate::error::ImageError;

/// Width and height of an image, in pixels.
///
/// # Example
///
/// ```
/// use cbir_image::ImageSize;
///
/// let size: ImageSize = [640, 480].into();
/// assert_eq!(size.width, 640);
/// assert_eq!(size.area(), 640 * 480);
/// assert_eq!(size.to_string(), "640x480");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// `[width, height]`.
impl From<[usize; 2]> for ImageSize {
    fn from([width, height]: [usize; 2]) -> Self {
        ImageSize { width, height }
    }
}

/// A decoded image with `CHANNELS` interleaved samples of type `T` per pixel.
///
/// Samples are stored row by row, so the sample `c` of pixel `(x, y)` lives at
/// `(y * cols + x) * CHANNELS + c`. Three-channel 8-bit images produced by
/// `cbir-io` are in R, G, B order.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Wrap interleaved pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidChannelShape`] if `data` does not hold
    /// exactly `size.area() * CHANNELS` samples.
    ///
    /// # Example
    ///
    /// ```
    /// use cbir_image::{Image, ImageSize};
    ///
    /// let size = ImageSize { width: 2, height: 1 };
    /// assert!(Image::<u8, 3>::new(size, vec![0; 6]).is_ok());
    /// assert!(Image::<u8, 3>::new(size, vec![0; 5]).is_err());
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.area() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// An image of `size` with every sample set to `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.area() * CHANNELS])
    }

    /// The image size.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The number of columns (the width).
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// The number of rows (the height).
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// The number of samples per pixel.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Whether the image covers zero pixels.
    pub fn is_empty(&self) -> bool {
        self.size.area() == 0
    }

    /// The interleaved samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved samples, mutably.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// The samples of the pixel at column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.cols() || y >= self.rows() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.cols(),
                self.rows(),
            ));
        }
        let start = (y * self.cols() + x) * CHANNELS;
        Ok(&self.data[start..start + CHANNELS])
    }

    /// Convert every sample to `U` and multiply it by `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::CastError`] if a sample is not representable in `U`.
    ///
    /// # Example
    ///
    /// ```
    /// use cbir_image::Image;
    ///
    /// let image = Image::<u8, 1>::new([3, 1].into(), vec![0, 51, 255]).unwrap();
    /// let doubled = image.cast_and_scale::<f32>(2.0).unwrap();
    /// assert_eq!(doubled.as_slice(), &[0.0, 102.0, 510.0]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, CHANNELS>, ImageError>
    where
        T: Copy + num_traits::NumCast,
        U: Copy + num_traits::NumCast + std::ops::Mul<Output = U>,
    {
        let data = self
            .data
            .iter()
            .map(|&v| {
                U::from(v)
                    .map(|u| u * scale)
                    .ok_or_else(|| ImageError::CastError(std::any::type_name::<U>().to_string()))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, data)
    }
}
