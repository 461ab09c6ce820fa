use cbir_image::Image;
use cbir_imgproc::{color, crop, filter, histogram};

use crate::config::{Color2dSpace, ExtractorConfig, RegionHistogram, RegionPartition};
use crate::error::FeatureError;
use crate::feature::{Descriptor, FeatureLayout, FeatureType, ImageFeature};

const SOBEL_KERNEL_SIZE: usize = 3;
const HUE_RANGE: f32 = 360.0;
const SAT_RANGE: f32 = 256.0;

/// Computes descriptors from decoded RGB images.
///
/// The extractor holds no state besides its configuration; every call is a
/// pure function of the image, so one extractor can be shared across threads.
///
/// # Example
///
/// ```
/// use cbir_image::{Image, ImageSize};
/// use cbir_features::{ExtractorConfig, FeatureExtractor, FeatureType};
///
/// let extractor = FeatureExtractor::new(ExtractorConfig::default()).unwrap();
/// let image = Image::<u8, 3>::from_size_val(ImageSize { width: 9, height: 9 }, 7).unwrap();
///
/// let feature = extractor.extract_feature("a.png", &image, FeatureType::BaselinePatch).unwrap();
/// assert_eq!(feature.descriptor().len(), 147);
/// ```
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    /// Create an extractor from a validated configuration.
    pub fn new(config: ExtractorConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        log::debug!("extractor configuration: {config:?}");
        Ok(Self { config })
    }

    /// The extractor configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The descriptor layout produced for a feature type under this configuration.
    pub fn layout(&self, feature_type: FeatureType) -> FeatureLayout {
        let c = &self.config;
        let segments = match feature_type {
            FeatureType::BaselinePatch => {
                let side = 2 * c.patch_half_width + 1;
                vec![side * side * 3]
            }
            FeatureType::Color2d => vec![c.color_2d.bins_a * c.color_2d.bins_b],
            FeatureType::MultiRegion => {
                let region = c.multi_region.histogram.len();
                vec![region, region]
            }
            FeatureType::ColorTexture => vec![c.rgb_bins.pow(3), c.texture_bins],
            FeatureType::Custom => vec![
                c.custom.hue_bins * c.custom.sat_bins,
                c.custom.orientation_bins,
            ],
            FeatureType::DnnEmbedding => return FeatureLayout::embedding(),
        };
        FeatureLayout::new(feature_type, segments)
    }

    /// Compute the descriptor of an image.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Dimension`] when the image is too small for a
    /// baseline patch and [`FeatureError::NotImageDerived`] for embeddings.
    pub fn extract(
        &self,
        image: &Image<u8, 3>,
        feature_type: FeatureType,
    ) -> Result<Descriptor, FeatureError> {
        let descriptor = match feature_type {
            FeatureType::BaselinePatch => {
                Descriptor::Integer(baseline_patch(image, self.config.patch_half_width)?)
            }
            FeatureType::Color2d => Descriptor::Real(self.color_2d(image)?),
            FeatureType::MultiRegion => Descriptor::Real(self.multi_region(image)?),
            FeatureType::ColorTexture => Descriptor::Real(self.color_texture(image)?),
            FeatureType::Custom => Descriptor::Real(self.custom(image)?),
            FeatureType::DnnEmbedding => {
                return Err(FeatureError::NotImageDerived(feature_type));
            }
        };
        Ok(descriptor)
    }

    /// Compute the descriptor of an image and attach a name to it.
    pub fn extract_feature(
        &self,
        name: impl Into<String>,
        image: &Image<u8, 3>,
        feature_type: FeatureType,
    ) -> Result<ImageFeature, FeatureError> {
        let descriptor = self.extract(image, feature_type)?;
        ImageFeature::new(name, &self.layout(feature_type), descriptor)
    }

    fn color_2d(&self, image: &Image<u8, 3>) -> Result<Vec<f64>, FeatureError> {
        let c = &self.config.color_2d;
        match c.space {
            Color2dSpace::HueSaturation => hue_saturation_histogram(image, c.bins_a, c.bins_b),
            Color2dSpace::RgChromaticity => rg_chromaticity_histogram(image, c.bins_a, c.bins_b),
        }
    }

    fn multi_region(&self, image: &Image<u8, 3>) -> Result<Vec<f64>, FeatureError> {
        let c = &self.config.multi_region;
        let (first, second) = split_regions(image, c.partition)?;

        let region_histogram = |region: &Image<u8, 3>| match c.histogram {
            RegionHistogram::Rgb { bins } => rgb_histogram(region, bins),
            RegionHistogram::HueSaturation { hue_bins, sat_bins } => {
                hue_saturation_histogram(region, hue_bins, sat_bins)
            }
        };

        let mut descriptor = region_histogram(&first)?;
        descriptor.extend(region_histogram(&second)?);
        Ok(descriptor)
    }

    fn color_texture(&self, image: &Image<u8, 3>) -> Result<Vec<f64>, FeatureError> {
        let mut descriptor = rgb_histogram(image, self.config.rgb_bins)?;
        descriptor.extend(texture_histogram(image, self.config.texture_bins)?);
        Ok(descriptor)
    }

    fn custom(&self, image: &Image<u8, 3>) -> Result<Vec<f64>, FeatureError> {
        let c = &self.config.custom;
        let mut descriptor = hue_saturation_histogram(image, c.hue_bins, c.sat_bins)?;
        descriptor.extend(orientation_histogram(image, c.orientation_bins)?);
        Ok(descriptor)
    }
}

/// Sample the square patch of side `2 * half_width + 1` centered at `(cols / 2, rows / 2)`.
///
/// Pixels are visited row by row and each contributes its channels in B, G, R
/// order, the layout of baseline stores written by other tools.
///
/// # Errors
///
/// Returns [`FeatureError::Dimension`] if either side of the image is shorter
/// than the patch.
pub fn baseline_patch(image: &Image<u8, 3>, half_width: usize) -> Result<Vec<i32>, FeatureError> {
    let side = 2 * half_width + 1;
    if image.cols() < side || image.rows() < side {
        return Err(FeatureError::Dimension {
            required: side,
            width: image.cols(),
            height: image.rows(),
        });
    }

    // the patch fits, so the window starts at a non-negative offset
    let x0 = image.cols() / 2 - half_width;
    let y0 = image.rows() / 2 - half_width;

    let mut descriptor = Vec::with_capacity(side * side * 3);
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            descriptor.extend(image.pixel(x, y)?.iter().rev().map(|&v| v as i32));
        }
    }
    Ok(descriptor)
}

/// Normalized joint RGB histogram with `bins` per channel.
pub fn rgb_histogram(image: &Image<u8, 3>, bins: usize) -> Result<Vec<f64>, FeatureError> {
    let counts = histogram::rgb_histogram(image, bins)?;
    Ok(histogram::normalize_counts(&counts, image.size().area()))
}

/// Normalized hue/saturation histogram, hue over [0, 360) and saturation over [0, 256).
pub fn hue_saturation_histogram(
    image: &Image<u8, 3>,
    hue_bins: usize,
    sat_bins: usize,
) -> Result<Vec<f64>, FeatureError> {
    let rgb = image.cast_and_scale::<f32>(1.0)?;
    let mut hs = Image::<f32, 2>::from_size_val(image.size(), 0.0)?;
    color::hue_saturation_from_rgb(&rgb, &mut hs)?;

    let counts =
        histogram::histogram_2d(&hs, [0, 1], [hue_bins, sat_bins], [HUE_RANGE, SAT_RANGE])?;
    Ok(histogram::normalize_counts(&counts, image.size().area()))
}

/// Normalized rg-chromaticity histogram over [0, 1] x [0, 1].
///
/// A chromaticity of exactly 1 falls in the last bin.
pub fn rg_chromaticity_histogram(
    image: &Image<u8, 3>,
    r_bins: usize,
    g_bins: usize,
) -> Result<Vec<f64>, FeatureError> {
    let rgb = image.cast_and_scale::<f32>(1.0)?;
    let mut rg = Image::<f32, 2>::from_size_val(image.size(), 0.0)?;
    color::rg_from_rgb(&rgb, &mut rg)?;

    let counts = histogram::histogram_2d(&rg, [0, 1], [r_bins, g_bins], [1.0, 1.0])?;
    Ok(histogram::normalize_counts(&counts, image.size().area()))
}

/// Sobel gradients of the grayscale version of an image.
fn gray_gradients(image: &Image<u8, 3>) -> Result<(Image<f32, 1>, Image<f32, 1>), FeatureError> {
    let rgb = image.cast_and_scale::<f32>(1.0)?;
    let mut gray = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    color::gray_from_rgb(&rgb, &mut gray)?;

    let mut dx = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    let mut dy = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    filter::spatial_gradient(&gray, &mut dx, &mut dy, SOBEL_KERNEL_SIZE)?;
    Ok((dx, dy))
}

/// Normalized histogram of gradient magnitudes.
///
/// The bins span `[0, max(max_magnitude, 1))` where `max_magnitude` is the
/// largest magnitude of this image, so bin boundaries depend on the image's
/// own contrast.
pub fn texture_histogram(image: &Image<u8, 3>, bins: usize) -> Result<Vec<f64>, FeatureError> {
    let (dx, dy) = gray_gradients(image)?;
    let mut mag = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    filter::magnitude(&dx, &dy, &mut mag)?;

    let max_magnitude = mag.as_slice().iter().copied().fold(0.0f32, f32::max);
    let counts = histogram::histogram_1d(&mag, bins, max_magnitude.max(1.0))?;
    Ok(histogram::normalize_counts(&counts, image.size().area()))
}

/// Normalized histogram of gradient orientations over [0, 360) degrees.
pub fn orientation_histogram(image: &Image<u8, 3>, bins: usize) -> Result<Vec<f64>, FeatureError> {
    let (dx, dy) = gray_gradients(image)?;
    let mut orientation = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    filter::orientation_degrees(&dx, &dy, &mut orientation)?;

    let counts = histogram::histogram_1d(&orientation, bins, HUE_RANGE)?;
    Ok(histogram::normalize_counts(&counts, image.size().area()))
}

/// Split an image into the two regions of a multi-region descriptor.
pub fn split_regions(
    image: &Image<u8, 3>,
    partition: RegionPartition,
) -> Result<(Image<u8, 3>, Image<u8, 3>), FeatureError> {
    let (cols, rows) = (image.cols(), image.rows());
    match partition {
        RegionPartition::TopBottom => {
            let mid = rows / 2;
            let top = crop::crop_image(image, 0, 0, [cols, mid].into())?;
            let bottom = crop::crop_image(image, 0, mid, [cols, rows - mid].into())?;
            Ok((top, bottom))
        }
        RegionPartition::WholeAndCenter => {
            let (w, h) = (cols / 2, rows / 2);
            let (x, y) = (cols / 2 - w / 2, rows / 2 - h / 2);
            let center = crop::crop_image(image, x, y, [w, h].into())?;
            Ok((image.clone(), center))
        }
    }
}

/// Scale a vector to unit L2 norm in place. A zero vector is left unchanged.
///
/// # Example
///
/// ```
/// use cbir_features::extract::normalize_embedding;
///
/// let mut v = vec![3.0, 0.0, 4.0];
/// normalize_embedding(&mut v);
/// assert_eq!(v, vec![0.6, 0.0, 0.8]);
///
/// let mut zero = vec![0.0; 3];
/// normalize_embedding(&mut zero);
/// assert_eq!(zero, vec![0.0; 3]);
/// ```
pub fn normalize_embedding(values: &mut [f64]) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cbir_image::ImageSize;

    fn extractor() -> Result<FeatureExtractor, FeatureError> {
        FeatureExtractor::new(ExtractorConfig::default())
    }

    fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Result<Image<u8, 3>, FeatureError> {
        let data = (0..width * height).flat_map(|_| rgb).collect();
        Ok(Image::new(ImageSize { width, height }, data)?)
    }

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn default_layouts() -> Result<(), FeatureError> {
        let extractor = extractor()?;
        let dims: Vec<_> = FeatureType::ALL
            .iter()
            .map(|&ty| extractor.layout(ty).dimension())
            .collect();
        assert_eq!(dims, vec![147, 256, 1024, 528, 144, 512]);
        assert_eq!(
            extractor.layout(FeatureType::MultiRegion).segments(),
            &[512, 512]
        );
        Ok(())
    }

    #[test]
    fn baseline_patch_samples_center() -> Result<(), FeatureError> {
        // pixel (x, y) holds [x, y, 100]
        let (width, height) = (9, 8);
        let data = (0..height)
            .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, 100]))
            .collect();
        let image = Image::<u8, 3>::new(ImageSize { width, height }, data)?;

        let patch = baseline_patch(&image, 3)?;
        assert_eq!(patch.len(), 147);
        // center is (4, 4): the window spans x in [1, 7] and y in [1, 7]
        assert_eq!(&patch[..3], &[100, 1, 1]);
        assert_eq!(&patch[3..6], &[100, 1, 2]);
        assert_eq!(&patch[144..], &[100, 7, 7]);
        Ok(())
    }

    #[test]
    fn baseline_patch_is_bgr() -> Result<(), FeatureError> {
        let image = solid(7, 7, [255, 0, 0])?;
        let patch = baseline_patch(&image, 3)?;
        assert!(patch.chunks(3).all(|bgr| bgr == [0, 0, 255]));
        Ok(())
    }

    #[test]
    fn baseline_patch_too_small() -> Result<(), FeatureError> {
        let image = solid(6, 20, [0, 0, 0])?;
        let res = baseline_patch(&image, 3);
        assert!(matches!(
            res,
            Err(FeatureError::Dimension {
                required: 7,
                width: 6,
                height: 20
            })
        ));

        assert_eq!(baseline_patch(&solid(7, 7, [1, 2, 3])?, 3)?.len(), 147);
        Ok(())
    }

    #[test]
    fn color_2d_sums_to_one() -> Result<(), FeatureError> {
        let extractor = extractor()?;
        let data = (0..16 * 12).flat_map(|i| [(i * 7) as u8, (i * 3) as u8, 40]).collect();
        let image = Image::<u8, 3>::new(ImageSize { width: 16, height: 12 }, data)?;

        let descriptor = extractor.extract(&image, FeatureType::Color2d)?;
        let hist = descriptor.as_real().unwrap_or_default();
        assert_eq!(hist.len(), 256);
        assert_relative_eq!(sum(hist), 1.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn rg_chromaticity_black_is_neutral() -> Result<(), FeatureError> {
        let hist = rg_chromaticity_histogram(&solid(4, 4, [0, 0, 0])?, 16, 16)?;
        // 1/3 falls in bin 5 of 16 on both axes
        assert_relative_eq!(hist[5 * 16 + 5], 1.0);
        Ok(())
    }

    #[test]
    fn hue_saturation_of_pure_red() -> Result<(), FeatureError> {
        let hist = hue_saturation_histogram(&solid(3, 3, [255, 0, 0])?, 16, 8)?;
        assert_eq!(hist.len(), 128);
        // hue 0, saturation 255
        assert_relative_eq!(hist[7], 1.0);
        Ok(())
    }

    #[test]
    fn multi_region_top_bottom() -> Result<(), FeatureError> {
        let extractor = extractor()?;
        let mut data = Vec::new();
        for y in 0..4 {
            for _ in 0..4 {
                data.extend(if y < 2 { [255, 0, 0] } else { [0, 0, 255] });
            }
        }
        let image = Image::<u8, 3>::new(ImageSize { width: 4, height: 4 }, data)?;

        let descriptor = extractor.extract(&image, FeatureType::MultiRegion)?;
        let hist = descriptor.as_real().unwrap_or_default();
        assert_eq!(hist.len(), 1024);
        assert_relative_eq!(hist[7 * 64], 1.0);
        assert_relative_eq!(hist[512 + 7], 1.0);
        assert_relative_eq!(sum(&hist[..512]), 1.0);
        assert_relative_eq!(sum(&hist[512..]), 1.0);
        Ok(())
    }

    #[test]
    fn whole_and_center_regions() -> Result<(), FeatureError> {
        let image = solid(10, 7, [1, 2, 3])?;
        let (whole, center) = split_regions(&image, RegionPartition::WholeAndCenter)?;
        assert_eq!(whole.size(), image.size());
        assert_eq!(center.size(), ImageSize { width: 5, height: 3 });

        let (top, bottom) = split_regions(&image, RegionPartition::TopBottom)?;
        assert_eq!(top.rows(), 3);
        assert_eq!(bottom.rows(), 4);
        Ok(())
    }

    #[test]
    fn texture_of_flat_image() -> Result<(), FeatureError> {
        let hist = texture_histogram(&solid(8, 8, [90, 90, 90])?, 16)?;
        assert_eq!(hist.len(), 16);
        assert_relative_eq!(hist[0], 1.0);
        Ok(())
    }

    #[test]
    fn texture_scales_by_image_maximum() -> Result<(), FeatureError> {
        // vertical step edge: the strongest gradients land in the last bin
        let data = (0..8 * 8)
            .flat_map(|i| if i % 8 < 4 { [0u8; 3] } else { [200u8; 3] })
            .collect();
        let image = Image::<u8, 3>::new(ImageSize { width: 8, height: 8 }, data)?;

        let hist = texture_histogram(&image, 16)?;
        assert!(hist[15] > 0.0);
        assert_relative_eq!(sum(&hist), 1.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn custom_dimension_and_segments() -> Result<(), FeatureError> {
        let extractor = extractor()?;
        let data = (0..10 * 10).flat_map(|i| [(i * 5) as u8, 50, (255 - i) as u8]).collect();
        let image = Image::<u8, 3>::new(ImageSize { width: 10, height: 10 }, data)?;

        let descriptor = extractor.extract(&image, FeatureType::Custom)?;
        let hist = descriptor.as_real().unwrap_or_default();
        assert_eq!(hist.len(), 144);
        assert_relative_eq!(sum(&hist[..128]), 1.0, epsilon = 1e-9);
        assert_relative_eq!(sum(&hist[128..]), 1.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn zero_area_image() -> Result<(), FeatureError> {
        let extractor = extractor()?;
        let image = Image::<u8, 3>::new(ImageSize { width: 0, height: 0 }, vec![])?;

        let descriptor = extractor.extract(&image, FeatureType::ColorTexture)?;
        let hist = descriptor.as_real().unwrap_or_default();
        assert_eq!(hist.len(), 528);
        assert!(hist.iter().all(|&v| v == 0.0));

        assert!(extractor.extract(&image, FeatureType::BaselinePatch).is_err());
        Ok(())
    }

    #[test]
    fn embeddings_are_not_extracted() -> Result<(), FeatureError> {
        let res = extractor()?.extract(&solid(8, 8, [0, 0, 0])?, FeatureType::DnnEmbedding);
        assert!(matches!(res, Err(FeatureError::NotImageDerived(_))));
        Ok(())
    }
}
