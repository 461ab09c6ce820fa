use argh::FromArgs;
use std::path::{Path, PathBuf};

use cbir::features::config::Config;
use cbir::features::{pipeline, FeatureExtractor, FeatureType, Match};

#[derive(FromArgs)]
/// Extract image descriptors into stores and rank images against them
struct Args {
    /// path to a JSON configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Extract(ExtractArgs),
    ExtractAll(ExtractAllArgs),
    Match(MatchArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "extract")]
/// extract one feature type from every image of a directory
struct ExtractArgs {
    /// directory of images
    #[argh(option, short = 'i')]
    image_dir: PathBuf,

    /// output store file
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// baseline-patch, color-2d, multi-region, color-texture or custom
    #[argh(option, short = 'f')]
    feature: FeatureType,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "extract-all")]
/// extract every feature type, writing baseline.csv, hist.csv, multihist.csv, ct.csv and custom.csv
struct ExtractAllArgs {
    /// directory of images
    #[argh(option, short = 'i')]
    image_dir: PathBuf,

    /// output directory, the current directory by default
    #[argh(option, short = 'o', default = "PathBuf::from(\".\")")]
    output_dir: PathBuf,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "match")]
/// rank the records of a store against a query image
struct MatchArgs {
    /// query image path, or file name when --image-dir is given; record name for embeddings
    #[argh(option, short = 'q')]
    query: String,

    /// store file to search
    #[argh(option, short = 's')]
    store: PathBuf,

    /// number of matches to return
    #[argh(option, short = 'n', default = "3")]
    top_n: usize,

    /// feature type of the store, inferred from its file name when omitted
    #[argh(option, short = 'f')]
    feature: Option<FeatureType>,

    /// directory the query file name is resolved against
    #[argh(option)]
    image_dir: Option<PathBuf>,

    /// multi-region weights, given twice (e.g. -w 0.6 -w 0.4)
    #[argh(option, short = 'w')]
    region_weight: Vec<f64>,
}

fn infer_feature_type(store: &Path) -> Result<FeatureType, Box<dyn std::error::Error>> {
    store
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(FeatureType::from_store_stem)
        .ok_or_else(|| {
            format!(
                "cannot infer the feature type of {}, pass --feature",
                store.display()
            )
            .into()
        })
}

fn run_match(args: MatchArgs, mut config: Config) -> Result<Vec<Match>, Box<dyn std::error::Error>> {
    let feature_type = match args.feature {
        Some(feature_type) => feature_type,
        None => infer_feature_type(&args.store)?,
    };

    match args.region_weight.as_slice() {
        [] => {}
        &[top, bottom] => config.metric.region_weights = Some([top, bottom]),
        other => return Err(format!("expected two region weights, got {}", other.len()).into()),
    }

    if feature_type == FeatureType::DnnEmbedding {
        return Ok(pipeline::match_embedding(
            &args.query,
            &args.store,
            &config.metric,
            args.top_n,
        )?);
    }

    let query_path = match &args.image_dir {
        Some(dir) => dir.join(&args.query),
        None => PathBuf::from(&args.query),
    };

    let extractor = FeatureExtractor::new(config.extractor)?;
    Ok(pipeline::match_image(
        query_path,
        &args.store,
        &extractor,
        feature_type,
        &config.metric,
        args.top_n,
    )?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Extract(extract) => {
            let extractor = FeatureExtractor::new(config.extractor)?;
            let report = pipeline::extract_to_store(
                &extract.image_dir,
                &extract.output,
                &extractor,
                extract.feature,
            )?;
            if !report.failures.is_empty() {
                log::warn!("{} images were skipped", report.failures.len());
            }
        }
        Command::ExtractAll(extract) => {
            let extractor = FeatureExtractor::new(config.extractor)?;
            std::fs::create_dir_all(&extract.output_dir)?;
            let report = pipeline::extract_all(&extract.image_dir, &extract.output_dir, &extractor)?;
            for (feature_type, path, store) in &report.stores {
                log::info!(
                    "{feature_type}: {} records in {}, {} skipped",
                    store.features.len(),
                    path.display(),
                    store.failures.len()
                );
            }
        }
        Command::Match(query) => {
            for m in run_match(query, config)? {
                println!("{} {:.6}", m.name, m.distance);
            }
        }
    }

    Ok(())
}
