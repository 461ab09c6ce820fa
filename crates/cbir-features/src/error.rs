use std::path::PathBuf;

use cbir_image::ImageError;
use cbir_io::IoError;

use crate::feature::{DescriptorKind, FeatureType};

/// An error type for descriptor extraction, storage and matching.
#[derive(thiserror::Error, Debug)]
pub enum FeatureError {
    /// A file or directory cannot be opened, read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file or directory cannot be accessed through the image reader.
    #[error(transparent)]
    Source(#[from] IoError),

    /// An image file cannot be decoded.
    #[error("Failed to decode image {0}: {1}")]
    Decode(String, #[source] IoError),

    /// The image is smaller than the extractor's required minimum.
    #[error("Image of size {width}x{height} is smaller than the required {required}x{required}")]
    Dimension {
        /// The minimum side length.
        required: usize,
        /// The width of the image.
        width: usize,
        /// The height of the image.
        height: usize,
    },

    /// A store line carries the wrong number of values.
    #[error("Expected {expected} values but found {found}")]
    Parse {
        /// The dimension of the layout.
        expected: usize,
        /// The number of value tokens on the line.
        found: usize,
    },

    /// A store token cannot be parsed as a number of the expected kind.
    #[error("Invalid {kind:?} value {token:?} at position {index}")]
    InvalidNumber {
        /// The zero-based position of the value within the descriptor.
        index: usize,
        /// The offending token.
        token: String,
        /// The expected element kind.
        kind: DescriptorKind,
    },

    /// A store line is not valid UTF-8.
    #[error("Store line is not valid UTF-8. {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    /// A feature name that cannot be written as a store record.
    #[error("Invalid feature name {0:?}")]
    InvalidName(String),

    /// A named query is absent from the store.
    #[error("No record named {0:?} in the store")]
    Lookup(String),

    /// Multi-region matching was requested without region weights.
    #[error("Multi-region matching requires region weights")]
    MissingRegionWeights,

    /// The extractor or metric configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file cannot be parsed.
    #[error("Failed to parse configuration. {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// A feature type name is not recognized.
    #[error("Unknown feature type {0:?}")]
    UnknownFeatureType(String),

    /// A feature type that cannot be computed from pixels.
    #[error("Feature type {0} is not extracted from images")]
    NotImageDerived(FeatureType),

    /// Two features of different types were compared.
    #[error("Cannot compare {found} features against a {expected} query")]
    FeatureTypeMismatch {
        /// The feature type of the query.
        expected: FeatureType,
        /// The feature type of the database entry.
        found: FeatureType,
    },

    /// A descriptor does not match the expected kind or length.
    #[error("Expected a {expected_kind:?} descriptor of length {expected_len}, found {found_kind:?} of length {found_len}")]
    DescriptorMismatch {
        /// The expected element kind.
        expected_kind: DescriptorKind,
        /// The expected length.
        expected_len: usize,
        /// The element kind found.
        found_kind: DescriptorKind,
        /// The length found.
        found_len: usize,
    },

    /// The store holds no records.
    #[error("The store {} holds no records", .0.display())]
    EmptyDatabase(PathBuf),

    /// The store has lines but none of them parse.
    #[error("None of the {lines} lines of {} could be parsed", .path.display())]
    MalformedStore {
        /// The store path.
        path: PathBuf,
        /// The number of non-empty lines.
        lines: usize,
    },

    /// An image processing error.
    #[error(transparent)]
    Image(#[from] ImageError),
}
