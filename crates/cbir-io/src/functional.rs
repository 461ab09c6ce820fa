use std::path::Path;

use cbir_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path and converts it to 8-bit RGB.
///
/// The method tries to read from any image format enabled in the image crate
/// (JPEG, PNG, PNM, TIFF). Grayscale and alpha images are converted to RGB.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the image data.
///
/// # Errors
///
/// Returns [`IoError::FileDoesNotExist`] for a missing file and
/// [`IoError::ImageDecodeError`] when the content cannot be decoded.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let bytes = std::fs::read(file_path)?;
    decode_image_rgb8(&bytes)
}

/// Decodes an in-memory encoded image into 8-bit RGB.
///
/// # Errors
///
/// Returns [`IoError::ImageDecodeError`] when the format cannot be guessed or decoded.
pub fn decode_image_rgb8(bytes: &[u8]) -> Result<Image<u8, 3>, IoError> {
    let img = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}
