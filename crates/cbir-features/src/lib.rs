#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Extractor and metric configuration.
pub mod config;

/// Error types for descriptor extraction, storage and matching.
pub mod error;

/// Pixel to descriptor transforms.
pub mod extract;

/// Feature types, descriptors and layouts.
pub mod feature;

/// Ranking of a descriptor database against a query.
pub mod matcher;

/// Distances between descriptors.
pub mod metric;

/// Batch extraction and store-backed matching.
pub mod pipeline;

/// Text line codec for descriptor stores.
pub mod store;

pub use config::{Config, ExtractorConfig, MetricConfig};
pub use error::FeatureError;
pub use extract::FeatureExtractor;
pub use feature::{Descriptor, DescriptorKind, FeatureLayout, FeatureType, ImageFeature};
pub use matcher::{Match, Matcher};
pub use metric::DistanceMetric;
