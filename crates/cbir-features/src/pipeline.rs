use std::path::{Path, PathBuf};

use cbir_image::Image;
use cbir_io::dir::{list_image_files, ImageEntry};
use cbir_io::functional::read_image_any_rgb8;
use rayon::prelude::*;

use crate::config::MetricConfig;
use crate::error::FeatureError;
use crate::extract::FeatureExtractor;
use crate::feature::{FeatureLayout, FeatureType, ImageFeature};
use crate::matcher::{Match, Matcher};
use crate::metric::DistanceMetric;
use crate::store::{self, StoreContents};

/// An image that produced no record.
#[derive(Debug)]
pub struct ExtractionFailure {
    /// The image file name.
    pub name: String,
    /// Why the image was skipped.
    pub error: FeatureError,
}

/// The outcome of extracting one feature type over a directory.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// The extracted records, sorted by name.
    pub features: Vec<ImageFeature>,
    /// The images that could not be processed.
    pub failures: Vec<ExtractionFailure>,
}

impl ExtractionReport {
    fn push(&mut self, name: &str, result: Result<ImageFeature, FeatureError>) {
        match result {
            Ok(feature) => self.features.push(feature),
            Err(error) => {
                log::warn!("skipping {name}: {error}");
                self.failures.push(ExtractionFailure {
                    name: name.to_string(),
                    error,
                });
            }
        }
    }

    fn sort(&mut self) {
        self.features.sort_by(|a, b| a.name().cmp(b.name()));
    }
}

/// The outcome of [`extract_all`].
#[derive(Debug, Default)]
pub struct ExtractAllReport {
    /// One report per image-derived feature type, with the store it was written to.
    pub stores: Vec<(FeatureType, PathBuf, ExtractionReport)>,
    /// The images that could not be read at all.
    pub unreadable: Vec<ExtractionFailure>,
}

/// The conventional store path of a feature type inside a directory, e.g. `hist.csv`.
pub fn store_path(dir: impl AsRef<Path>, feature_type: FeatureType) -> PathBuf {
    dir.as_ref()
        .join(format!("{}.csv", feature_type.store_stem()))
}

fn read_image(entry: &ImageEntry) -> Result<Image<u8, 3>, FeatureError> {
    read_image_any_rgb8(&entry.path).map_err(|e| FeatureError::Decode(entry.name.clone(), e))
}

fn check_image_derived(feature_type: FeatureType) -> Result<(), FeatureError> {
    match feature_type {
        FeatureType::DnnEmbedding => Err(FeatureError::NotImageDerived(feature_type)),
        _ => Ok(()),
    }
}

/// Extract one feature type from every image of a directory.
///
/// Images are processed in parallel. An image that cannot be decoded or is
/// too small is logged and recorded as a failure; the others are still
/// extracted.
///
/// # Errors
///
/// Fails only if the directory cannot be listed or the feature type is not
/// computed from pixels.
pub fn extract_directory(
    dir: impl AsRef<Path>,
    extractor: &FeatureExtractor,
    feature_type: FeatureType,
) -> Result<ExtractionReport, FeatureError> {
    check_image_derived(feature_type)?;
    let dir = dir.as_ref();
    let entries = list_image_files(dir)?;
    log::info!(
        "extracting {feature_type} features from {} images in {}",
        entries.len(),
        dir.display()
    );

    let results: Vec<_> = entries
        .par_iter()
        .map(|entry| {
            let feature = read_image(entry)
                .and_then(|image| extractor.extract_feature(&entry.name, &image, feature_type));
            (entry.name.as_str(), feature)
        })
        .collect();

    let mut report = ExtractionReport::default();
    for (name, result) in results {
        report.push(name, result);
    }
    report.sort();
    Ok(report)
}

/// Extract one feature type from a directory and write the records to a store.
pub fn extract_to_store(
    dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    extractor: &FeatureExtractor,
    feature_type: FeatureType,
) -> Result<ExtractionReport, FeatureError> {
    let report = extract_directory(dir, extractor, feature_type)?;
    store::write_file(&output, &report.features)?;
    log::info!(
        "wrote {} records to {} ({} failures)",
        report.features.len(),
        output.as_ref().display(),
        report.failures.len()
    );
    Ok(report)
}

/// Extract every image-derived feature type in one pass over a directory.
///
/// Each image is decoded once. The stores are written to `output_dir` under
/// their conventional names (see [`store_path`]).
pub fn extract_all(
    dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    extractor: &FeatureExtractor,
) -> Result<ExtractAllReport, FeatureError> {
    let dir = dir.as_ref();
    let entries = list_image_files(dir)?;
    log::info!(
        "extracting all features from {} images in {}",
        entries.len(),
        dir.display()
    );

    let results: Vec<_> = entries
        .par_iter()
        .map(|entry| {
            let features = read_image(entry).map(|image| {
                FeatureType::IMAGE_DERIVED
                    .map(|ty| extractor.extract_feature(&entry.name, &image, ty))
            });
            (entry.name.as_str(), features)
        })
        .collect();

    let mut reports: [ExtractionReport; 5] = Default::default();
    let mut unreadable = Vec::new();
    for (name, result) in results {
        match result {
            Ok(features) => {
                for (report, feature) in reports.iter_mut().zip(features) {
                    report.push(name, feature);
                }
            }
            Err(error) => {
                log::warn!("skipping {name}: {error}");
                unreadable.push(ExtractionFailure {
                    name: name.to_string(),
                    error,
                });
            }
        }
    }

    let mut stores = Vec::with_capacity(reports.len());
    for (feature_type, mut report) in FeatureType::IMAGE_DERIVED.into_iter().zip(reports) {
        report.sort();
        let path = store_path(&output_dir, feature_type);
        store::write_file(&path, &report.features)?;
        log::info!(
            "wrote {} {feature_type} records to {}",
            report.features.len(),
            path.display()
        );
        stores.push((feature_type, path, report));
    }

    Ok(ExtractAllReport { stores, unreadable })
}

fn load_store(path: &Path, layout: &FeatureLayout) -> Result<StoreContents, FeatureError> {
    let contents = store::read_file(path, layout)?;
    if contents.features.is_empty() {
        return Err(match contents.num_lines() {
            0 => FeatureError::EmptyDatabase(path.to_path_buf()),
            lines => FeatureError::MalformedStore {
                path: path.to_path_buf(),
                lines,
            },
        });
    }
    if !contents.skipped.is_empty() {
        log::warn!(
            "{} of {} lines of {} were skipped",
            contents.skipped.len(),
            contents.num_lines(),
            path.display()
        );
    }
    Ok(contents)
}

/// Load the records of a store as a matching database.
///
/// # Errors
///
/// Returns [`FeatureError::EmptyDatabase`] for a store without records and
/// [`FeatureError::MalformedStore`] when no line parses.
pub fn load_database(
    path: impl AsRef<Path>,
    layout: &FeatureLayout,
) -> Result<Vec<ImageFeature>, FeatureError> {
    Ok(load_store(path.as_ref(), layout)?.features)
}

/// Rank the records of a store against an image.
///
/// The query is named after the file name of `query_path`, so a store built
/// from the same directory never returns the query itself.
pub fn match_image(
    query_path: impl AsRef<Path>,
    store: impl AsRef<Path>,
    extractor: &FeatureExtractor,
    feature_type: FeatureType,
    metric_config: &MetricConfig,
    top_n: usize,
) -> Result<Vec<Match>, FeatureError> {
    let query_path = query_path.as_ref();
    let name = query_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| query_path.display().to_string());

    let image = read_image_any_rgb8(query_path).map_err(|e| FeatureError::Decode(name.clone(), e))?;
    let query = extractor.extract_feature(name, &image, feature_type)?;

    let layout = extractor.layout(feature_type);
    let metric = DistanceMetric::for_layout(&layout, metric_config)?;
    let database = load_database(store, &layout)?;
    Matcher::new(metric).rank(&query, &database, top_n)
}

/// Rank the records of an embedding store against one of its own records.
///
/// Every embedding, the query included, is L2-normalized before ranking.
///
/// # Errors
///
/// Returns [`FeatureError::Lookup`] when no record is named `query_name`, or
/// the parse error of the query's line when that line is malformed.
pub fn match_embedding(
    query_name: &str,
    store: impl AsRef<Path>,
    metric_config: &MetricConfig,
    top_n: usize,
) -> Result<Vec<Match>, FeatureError> {
    let layout = FeatureLayout::embedding();
    let metric = DistanceMetric::for_layout(&layout, metric_config)?;
    let mut contents = load_store(store.as_ref(), &layout)?;

    let database: Vec<_> = contents
        .features
        .into_iter()
        .map(ImageFeature::l2_normalized)
        .collect();

    let Some(query) = database.iter().find(|f| f.name() == query_name) else {
        if let Some(pos) = contents.skipped.iter().position(|s| s.name == query_name) {
            return Err(contents.skipped.swap_remove(pos).error);
        }
        return Err(FeatureError::Lookup(query_name.to_string()));
    };

    Matcher::new(metric).rank(query, &database, top_n)
}
