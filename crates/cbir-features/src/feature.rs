use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Dimension of the externally produced embeddings.
pub const EMBEDDING_DIM: usize = 512;

/// The closed set of descriptor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureType {
    /// Raw samples of a square patch centered in the image.
    BaselinePatch,
    /// 2D hue/saturation or rg-chromaticity histogram.
    #[serde(rename = "color-2d")]
    Color2d,
    /// Color histograms of two image regions, concatenated.
    MultiRegion,
    /// RGB histogram followed by a gradient-magnitude histogram.
    ColorTexture,
    /// Hue/saturation histogram followed by a gradient-orientation histogram.
    Custom,
    /// L2-normalized embedding produced by an external model.
    DnnEmbedding,
}

impl FeatureType {
    /// Every feature type, in declaration order.
    pub const ALL: [FeatureType; 6] = [
        FeatureType::BaselinePatch,
        FeatureType::Color2d,
        FeatureType::MultiRegion,
        FeatureType::ColorTexture,
        FeatureType::Custom,
        FeatureType::DnnEmbedding,
    ];

    /// The feature types computed from pixels by [`crate::FeatureExtractor`].
    pub const IMAGE_DERIVED: [FeatureType; 5] = [
        FeatureType::BaselinePatch,
        FeatureType::Color2d,
        FeatureType::MultiRegion,
        FeatureType::ColorTexture,
        FeatureType::Custom,
    ];

    /// The canonical name used on the command line and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::BaselinePatch => "baseline-patch",
            FeatureType::Color2d => "color-2d",
            FeatureType::MultiRegion => "multi-region",
            FeatureType::ColorTexture => "color-texture",
            FeatureType::Custom => "custom",
            FeatureType::DnnEmbedding => "dnn-embedding",
        }
    }

    /// The element kind of descriptors of this type.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            FeatureType::BaselinePatch => DescriptorKind::Integer,
            _ => DescriptorKind::Real,
        }
    }

    /// The conventional file stem of a store holding this feature type.
    pub fn store_stem(&self) -> &'static str {
        match self {
            FeatureType::BaselinePatch => "baseline",
            FeatureType::Color2d => "hist",
            FeatureType::MultiRegion => "multihist",
            FeatureType::ColorTexture => "ct",
            FeatureType::Custom => "custom",
            FeatureType::DnnEmbedding => "dnn",
        }
    }

    /// Recover the feature type from a conventional store file stem.
    ///
    /// # Example
    ///
    /// ```
    /// use cbir_features::FeatureType;
    ///
    /// assert_eq!(FeatureType::from_store_stem("multihist"), Some(FeatureType::MultiRegion));
    /// assert_eq!(FeatureType::from_store_stem("hist"), Some(FeatureType::Color2d));
    /// assert_eq!(FeatureType::from_store_stem("features"), None);
    /// ```
    pub fn from_store_stem(stem: &str) -> Option<FeatureType> {
        FeatureType::ALL
            .into_iter()
            .find(|ty| ty.store_stem() == stem)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| FeatureError::UnknownFeatureType(s.to_string()))
    }
}

/// The numeric kind of the elements of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Raw integer channel samples.
    Integer,
    /// Normalized histogram bins or embedding components.
    Real,
}

/// A fixed-length numeric vector summarizing one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Integer descriptor.
    Integer(Vec<i32>),
    /// Real descriptor.
    Real(Vec<f64>),
}

impl Descriptor {
    /// The element kind of the descriptor.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Integer(_) => DescriptorKind::Integer,
            Descriptor::Real(_) => DescriptorKind::Real,
        }
    }

    /// The number of components.
    pub fn len(&self) -> usize {
        match self {
            Descriptor::Integer(v) => v.len(),
            Descriptor::Real(v) => v.len(),
        }
    }

    /// Whether the descriptor has no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The components of a real descriptor, `None` for integer descriptors.
    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Descriptor::Real(v) => Some(v),
            Descriptor::Integer(_) => None,
        }
    }

    /// The components of an integer descriptor, `None` for real descriptors.
    pub fn as_integer(&self) -> Option<&[i32]> {
        match self {
            Descriptor::Integer(v) => Some(v),
            Descriptor::Real(_) => None,
        }
    }
}

/// The shape of the descriptors of one feature type under one configuration.
///
/// A layout is a sequence of segments; each segment is an independently
/// normalized histogram (or, for patches and embeddings, the whole vector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    feature_type: FeatureType,
    segments: Vec<usize>,
}

impl FeatureLayout {
    /// Create a layout from its segment lengths.
    pub fn new(feature_type: FeatureType, segments: Vec<usize>) -> Self {
        Self {
            feature_type,
            segments,
        }
    }

    /// The layout of externally produced embeddings.
    pub fn embedding() -> Self {
        Self::new(FeatureType::DnnEmbedding, vec![EMBEDDING_DIM])
    }

    /// The feature type described by this layout.
    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// The segment lengths, in descriptor order.
    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    /// The total descriptor length.
    pub fn dimension(&self) -> usize {
        self.segments.iter().sum()
    }

    /// The element kind of descriptors with this layout.
    pub fn kind(&self) -> DescriptorKind {
        self.feature_type.kind()
    }

    /// Check that a descriptor matches this layout in kind and length.
    pub fn check(&self, descriptor: &Descriptor) -> Result<(), FeatureError> {
        if descriptor.kind() != self.kind() || descriptor.len() != self.dimension() {
            return Err(FeatureError::DescriptorMismatch {
                expected_kind: self.kind(),
                expected_len: self.dimension(),
                found_kind: descriptor.kind(),
                found_len: descriptor.len(),
            });
        }
        Ok(())
    }
}

/// Check that a name survives a store round trip unchanged.
///
/// A name must be non-empty, must not contain a comma or a line break and
/// must not start or end with whitespace.
pub fn check_name(name: &str) -> Result<(), FeatureError> {
    if name.is_empty() || name.contains([',', '\n', '\r']) || name.trim() != name {
        return Err(FeatureError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A named descriptor of a known feature type.
///
/// The descriptor length always equals the dimension of the layout it was
/// created with.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFeature {
    name: String,
    feature_type: FeatureType,
    descriptor: Descriptor,
}

impl ImageFeature {
    /// Create a feature, checking the name and the descriptor against the layout.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidName`] if the name cannot be stored
    /// verbatim (see [`check_name`]) and [`FeatureError::DescriptorMismatch`]
    /// if the descriptor kind or length does not match the layout.
    pub fn new(
        name: impl Into<String>,
        layout: &FeatureLayout,
        descriptor: Descriptor,
    ) -> Result<Self, FeatureError> {
        let name = name.into();
        check_name(&name)?;
        layout.check(&descriptor)?;
        Ok(Self {
            name,
            feature_type: layout.feature_type(),
            descriptor,
        })
    }

    /// The unique identifier of the feature, usually the source file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The feature type of the descriptor.
    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// The descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Return this feature with its real descriptor scaled to unit L2 norm.
    ///
    /// Integer descriptors and zero vectors are returned unchanged.
    pub fn l2_normalized(mut self) -> Self {
        if let Descriptor::Real(values) = &mut self.descriptor {
            crate::extract::normalize_embedding(values);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_type_names_round_trip() -> Result<(), FeatureError> {
        for ty in FeatureType::ALL {
            assert_eq!(ty.as_str().parse::<FeatureType>()?, ty);
            assert_eq!(FeatureType::from_store_stem(ty.store_stem()), Some(ty));
        }
        assert!("histogram".parse::<FeatureType>().is_err());
        Ok(())
    }

    #[test]
    fn feature_type_serde_names() -> Result<(), serde_json::Error> {
        let ty: FeatureType = serde_json::from_str("\"color-2d\"")?;
        assert_eq!(ty, FeatureType::Color2d);
        assert_eq!(
            serde_json::to_string(&FeatureType::DnnEmbedding)?,
            "\"dnn-embedding\""
        );
        Ok(())
    }

    #[test]
    fn layout_dimension_and_check() {
        let layout = FeatureLayout::new(FeatureType::ColorTexture, vec![512, 16]);
        assert_eq!(layout.dimension(), 528);
        assert_eq!(layout.kind(), DescriptorKind::Real);
        assert!(layout.check(&Descriptor::Real(vec![0.0; 528])).is_ok());
        assert!(layout.check(&Descriptor::Real(vec![0.0; 527])).is_err());
        assert!(layout.check(&Descriptor::Integer(vec![0; 528])).is_err());
    }

    #[test]
    fn image_feature_rejects_wrong_length() {
        let layout = FeatureLayout::new(FeatureType::BaselinePatch, vec![147]);
        let res = ImageFeature::new("a.jpg", &layout, Descriptor::Integer(vec![0; 146]));
        assert!(matches!(
            res,
            Err(FeatureError::DescriptorMismatch {
                expected_len: 147,
                found_len: 146,
                ..
            })
        ));
    }

    #[test]
    fn image_feature_rejects_unstorable_names() {
        let layout = FeatureLayout::new(FeatureType::BaselinePatch, vec![1]);
        for name in ["", "a,b.jpg", " a.jpg", "a.jpg ", "a\nb.jpg"] {
            assert!(matches!(
                ImageFeature::new(name, &layout, Descriptor::Integer(vec![0])),
                Err(FeatureError::InvalidName(_))
            ));
        }
        assert!(ImageFeature::new("my photo.jpg", &layout, Descriptor::Integer(vec![0])).is_ok());
    }

    #[test]
    fn image_feature_l2_normalized() -> Result<(), FeatureError> {
        let layout = FeatureLayout::new(FeatureType::DnnEmbedding, vec![2]);
        let feature = ImageFeature::new("e.jpg", &layout, Descriptor::Real(vec![3.0, 4.0]))?;
        let normalized = feature.l2_normalized();
        assert_eq!(normalized.descriptor().as_real(), Some(&[0.6, 0.8][..]));
        Ok(())
    }
}
