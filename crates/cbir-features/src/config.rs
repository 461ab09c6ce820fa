use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::FeatureError;

/// Color space of the color-2d histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color2dSpace {
    /// Hue in degrees against saturation.
    HueSaturation,
    /// Normalized red against normalized green.
    RgChromaticity,
}

/// Parameters of the color-2d histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Color2dConfig {
    /// The color space.
    pub space: Color2dSpace,
    /// Bins along the first axis (hue or r).
    pub bins_a: usize,
    /// Bins along the second axis (saturation or g).
    pub bins_b: usize,
}

impl Default for Color2dConfig {
    fn default() -> Self {
        Self {
            space: Color2dSpace::RgChromaticity,
            bins_a: 16,
            bins_b: 16,
        }
    }
}

/// How an image is split into the two regions of a multi-region descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionPartition {
    /// Top half, then bottom half. The middle row goes to the bottom half.
    TopBottom,
    /// The whole image, then a centered crop of half the width and height.
    WholeAndCenter,
}

/// The histogram computed for each region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegionHistogram {
    /// Joint RGB histogram with `bins` per channel.
    Rgb {
        /// Bins per channel.
        bins: usize,
    },
    /// Hue/saturation histogram.
    HueSaturation {
        /// Hue bins.
        hue_bins: usize,
        /// Saturation bins.
        sat_bins: usize,
    },
}

impl RegionHistogram {
    /// The number of bins of one region histogram.
    pub fn len(&self) -> usize {
        match *self {
            RegionHistogram::Rgb { bins } => bins.saturating_mul(bins).saturating_mul(bins),
            RegionHistogram::HueSaturation { hue_bins, sat_bins } => {
                hue_bins.saturating_mul(sat_bins)
            }
        }
    }

    /// Whether the histogram has no bins.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parameters of the multi-region descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultiRegionConfig {
    /// The region partition.
    pub partition: RegionPartition,
    /// The per-region histogram.
    pub histogram: RegionHistogram,
}

impl Default for MultiRegionConfig {
    fn default() -> Self {
        Self {
            partition: RegionPartition::TopBottom,
            histogram: RegionHistogram::Rgb { bins: 8 },
        }
    }
}

/// Parameters of the custom descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomConfig {
    /// Hue bins of the color segment.
    pub hue_bins: usize,
    /// Saturation bins of the color segment.
    pub sat_bins: usize,
    /// Bins of the gradient-orientation segment.
    pub orientation_bins: usize,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            hue_bins: 16,
            sat_bins: 8,
            orientation_bins: 16,
        }
    }
}

/// Parameters of every image-derived descriptor.
///
/// The defaults produce the canonical dimensions: 147, 256, 2x512, 512+16
/// and 128+16.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Half side of the baseline patch; the patch is `2 * h + 1` pixels wide.
    pub patch_half_width: usize,
    /// The color-2d histogram.
    pub color_2d: Color2dConfig,
    /// The multi-region histograms.
    pub multi_region: MultiRegionConfig,
    /// Bins per channel of the color+texture RGB histogram.
    pub rgb_bins: usize,
    /// Bins of the color+texture gradient-magnitude histogram.
    pub texture_bins: usize,
    /// The custom descriptor.
    pub custom: CustomConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            patch_half_width: 3,
            color_2d: Color2dConfig::default(),
            multi_region: MultiRegionConfig::default(),
            rgb_bins: 8,
            texture_bins: 16,
            custom: CustomConfig::default(),
        }
    }
}

/// Largest bin count along one histogram axis.
pub const MAX_AXIS_BINS: usize = 4096;
/// Largest per-channel bin count of a joint RGB histogram.
pub const MAX_RGB_BINS: usize = 256;
/// Largest half side of the baseline patch.
pub const MAX_PATCH_HALF_WIDTH: usize = 1024;
/// Largest number of values in one descriptor segment.
pub const MAX_SEGMENT_LEN: usize = 1 << 24;

fn check_len(what: &str, factors: &[usize]) -> Result<(), FeatureError> {
    let len = factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .filter(|&len| len <= MAX_SEGMENT_LEN);
    match len {
        Some(_) => Ok(()),
        None => Err(FeatureError::InvalidConfig(format!(
            "{what} has more than {MAX_SEGMENT_LEN} bins"
        ))),
    }
}

fn check_bins(what: &str, bins: usize, max: usize) -> Result<(), FeatureError> {
    if bins == 0 || bins > max {
        return Err(FeatureError::InvalidConfig(format!(
            "{what} must be within [1, {max}], got {bins}"
        )));
    }
    Ok(())
}

impl ExtractorConfig {
    /// Load the configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every bin count and the patch size.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] for a zero bin count, a bin
    /// count above its bound, a patch half width above
    /// [`MAX_PATCH_HALF_WIDTH`] or a segment longer than [`MAX_SEGMENT_LEN`].
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.patch_half_width > MAX_PATCH_HALF_WIDTH {
            return Err(FeatureError::InvalidConfig(format!(
                "patch_half_width must be at most {MAX_PATCH_HALF_WIDTH}, got {}",
                self.patch_half_width
            )));
        }
        let side = 2 * self.patch_half_width + 1;
        check_len("baseline patch", &[side, side, 3])?;

        let c2 = &self.color_2d;
        check_bins("color_2d.bins_a", c2.bins_a, MAX_AXIS_BINS)?;
        check_bins("color_2d.bins_b", c2.bins_b, MAX_AXIS_BINS)?;
        check_len("color_2d", &[c2.bins_a, c2.bins_b])?;

        match self.multi_region.histogram {
            RegionHistogram::Rgb { bins } => {
                check_bins("multi_region.histogram.bins", bins, MAX_RGB_BINS)?;
                check_len("multi_region", &[bins, bins, bins])?;
            }
            RegionHistogram::HueSaturation { hue_bins, sat_bins } => {
                check_bins("multi_region.histogram.hue_bins", hue_bins, MAX_AXIS_BINS)?;
                check_bins("multi_region.histogram.sat_bins", sat_bins, MAX_AXIS_BINS)?;
                check_len("multi_region", &[hue_bins, sat_bins])?;
            }
        }

        check_bins("rgb_bins", self.rgb_bins, MAX_RGB_BINS)?;
        check_len("color_texture", &[self.rgb_bins, self.rgb_bins, self.rgb_bins])?;
        check_bins("texture_bins", self.texture_bins, MAX_AXIS_BINS)?;

        let custom = &self.custom;
        check_bins("custom.hue_bins", custom.hue_bins, MAX_AXIS_BINS)?;
        check_bins("custom.sat_bins", custom.sat_bins, MAX_AXIS_BINS)?;
        check_len("custom", &[custom.hue_bins, custom.sat_bins])?;
        check_bins("custom.orientation_bins", custom.orientation_bins, MAX_AXIS_BINS)?;
        Ok(())
    }
}

/// Weights of the segmented histogram-intersection distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricConfig {
    /// Weights of the two multi-region histograms. Required to match
    /// multi-region descriptors.
    pub region_weights: Option<[f64; 2]>,
    /// Weights of the color+texture and custom segments. Equal weights when unset.
    pub segment_weights: Option<Vec<f64>>,
}

impl MetricConfig {
    /// A configuration with the given region weights.
    pub fn with_region_weights(weights: [f64; 2]) -> Self {
        Self {
            region_weights: Some(weights),
            ..Default::default()
        }
    }

    /// Check that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), FeatureError> {
        let region = self.region_weights.iter().flatten();
        let segment = self.segment_weights.iter().flatten();
        if let Some(w) = region.chain(segment).find(|w| !w.is_finite() || **w < 0.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "weights must be finite and non-negative, got {w}"
            )));
        }
        Ok(())
    }
}

/// The full configuration file: extractor parameters and metric weights.
///
/// # Example
///
/// ```
/// use cbir_features::config::{Config, RegionPartition};
///
/// let config: Config = serde_json::from_str(r#"{
///     "extractor": { "multi_region": { "partition": "whole-and-center" } },
///     "metric": { "region_weights": [0.6, 0.4] }
/// }"#).unwrap();
///
/// assert_eq!(config.extractor.multi_region.partition, RegionPartition::WholeAndCenter);
/// assert_eq!(config.extractor.rgb_bins, 8);
/// assert_eq!(config.metric.region_weights, Some([0.6, 0.4]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extractor parameters.
    pub extractor: ExtractorConfig,
    /// Metric weights.
    pub metric: MetricConfig,
}

impl Config {
    /// Load and validate the configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let config: Self = read_json(path)?;
        config.extractor.validate()?;
        config.metric.validate()?;
        Ok(config)
    }
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, FeatureError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
