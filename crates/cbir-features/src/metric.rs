use crate::config::MetricConfig;
use crate::error::FeatureError;
use crate::feature::{Descriptor, DescriptorKind, FeatureLayout, FeatureType};

/// A weighted, contiguous slice of a segmented descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Number of bins in the segment.
    pub len: usize,
    /// Weight of the segment's intersection distance.
    pub weight: f64,
}

/// The distance used to compare two descriptors of the same feature type.
///
/// Lower is more similar for every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceMetric {
    /// Sum of squared differences of integer descriptors.
    SumSquaredDifference,
    /// Weighted sum of per-segment histogram-intersection distances.
    HistogramIntersection {
        /// The segments, in descriptor order.
        segments: Vec<Segment>,
    },
    /// One minus the cosine similarity of real descriptors.
    Cosine,
}

impl DistanceMetric {
    /// Select the metric bound to a feature type.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::MissingRegionWeights`] for multi-region layouts
    /// without region weights, and [`FeatureError::InvalidConfig`] when the
    /// segment weights do not match the number of segments.
    ///
    /// # Example
    ///
    /// ```
    /// use cbir_features::{DistanceMetric, ExtractorConfig, FeatureExtractor, FeatureType, MetricConfig};
    ///
    /// let extractor = FeatureExtractor::new(ExtractorConfig::default()).unwrap();
    /// let layout = extractor.layout(FeatureType::MultiRegion);
    ///
    /// assert!(DistanceMetric::for_layout(&layout, &MetricConfig::default()).is_err());
    ///
    /// let config = MetricConfig::with_region_weights([0.5, 0.5]);
    /// assert!(DistanceMetric::for_layout(&layout, &config).is_ok());
    /// ```
    pub fn for_layout(layout: &FeatureLayout, config: &MetricConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        let metric = match layout.feature_type() {
            FeatureType::BaselinePatch => DistanceMetric::SumSquaredDifference,
            FeatureType::DnnEmbedding => DistanceMetric::Cosine,
            FeatureType::Color2d => DistanceMetric::HistogramIntersection {
                segments: vec![Segment {
                    len: layout.dimension(),
                    weight: 1.0,
                }],
            },
            FeatureType::MultiRegion => {
                let weights = config
                    .region_weights
                    .ok_or(FeatureError::MissingRegionWeights)?;
                weighted_segments(layout.segments(), &weights)?
            }
            FeatureType::ColorTexture | FeatureType::Custom => match &config.segment_weights {
                Some(weights) => weighted_segments(layout.segments(), weights)?,
                None => {
                    let n = layout.segments().len();
                    weighted_segments(layout.segments(), &vec![1.0 / n as f64; n])?
                }
            },
        };
        log::debug!("{} metric: {metric:?}", layout.feature_type());
        Ok(metric)
    }

    /// The distance between two descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::DescriptorMismatch`] when the descriptors differ
    /// in kind or length, or do not fit the metric.
    pub fn distance(&self, a: &Descriptor, b: &Descriptor) -> Result<f64, FeatureError> {
        match (self, a, b) {
            (DistanceMetric::SumSquaredDifference, Descriptor::Integer(a), Descriptor::Integer(b))
                if a.len() == b.len() =>
            {
                Ok(sum_squared_difference(a, b))
            }
            (DistanceMetric::HistogramIntersection { segments }, Descriptor::Real(a), Descriptor::Real(b))
                if a.len() == b.len() && segments.iter().map(|s| s.len).sum::<usize>() == a.len() =>
            {
                let mut offset = 0;
                let mut distance = 0.0;
                for segment in segments {
                    let range = offset..offset + segment.len;
                    distance += segment.weight
                        * histogram_intersection_distance(&a[range.clone()], &b[range]);
                    offset += segment.len;
                }
                Ok(distance)
            }
            (DistanceMetric::Cosine, Descriptor::Real(a), Descriptor::Real(b)) if a.len() == b.len() => {
                Ok(cosine_distance(a, b))
            }
            _ => Err(FeatureError::DescriptorMismatch {
                expected_kind: self.kind(),
                expected_len: a.len(),
                found_kind: b.kind(),
                found_len: b.len(),
            }),
        }
    }

    fn kind(&self) -> DescriptorKind {
        match self {
            DistanceMetric::SumSquaredDifference => DescriptorKind::Integer,
            _ => DescriptorKind::Real,
        }
    }
}

fn weighted_segments(lens: &[usize], weights: &[f64]) -> Result<DistanceMetric, FeatureError> {
    if lens.len() != weights.len() {
        return Err(FeatureError::InvalidConfig(format!(
            "expected {} segment weights, got {}",
            lens.len(),
            weights.len()
        )));
    }
    let segments = lens
        .iter()
        .zip(weights)
        .map(|(&len, &weight)| Segment { len, weight })
        .collect();
    Ok(DistanceMetric::HistogramIntersection { segments })
}

/// Sum of squared differences, `Σ (a_i − b_i)²`.
///
/// PRECONDITION: `a` and `b` have the same length.
pub fn sum_squared_difference(a: &[i32], b: &[i32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Histogram intersection distance, `1 − Σ min(a_i, b_i)`.
///
/// The result lies in `[0, 1]` only when both histograms sum to 1.
///
/// # Example
///
/// ```
/// use cbir_features::metric::histogram_intersection_distance;
///
/// let a = [0.5, 0.5, 0.0];
/// let b = [0.0, 0.5, 0.5];
/// assert_eq!(histogram_intersection_distance(&a, &b), 0.5);
/// ```
pub fn histogram_intersection_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - a.iter().zip(b).map(|(&x, &y)| x.min(y)).sum::<f64>()
}

/// Cosine distance, `1 − a·b / (|a| |b|)`. Returns 1 if either vector is zero.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
