/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images that must agree in size do not.
    #[error("Image size mismatch: ({0}, {1}) vs ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel coordinate falls outside the image.
    #[error("Pixel ({0}, {1}) is out of bounds for an image of size ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel index is out of bounds.
    #[error("Channel index {0} is out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a crop window does not fit inside the source image.
    #[error("Crop window at ({0}, {1}) with size {2}x{3} exceeds the image bounds")]
    CropOutOfBounds(usize, usize, usize, usize),

    /// Error when a histogram is requested with an invalid number of bins.
    #[error("Invalid number of histogram bins: {0}")]
    InvalidHistogramBins(usize),

    /// Error when a filter kernel size is not supported.
    #[error("Unsupported kernel size: {0}")]
    InvalidKernelSize(usize),

    /// Error when a numeric cast fails.
    #[error("Failed to cast the pixel data to {0}")]
    CastError(String),
}
