//! One record per line: `<name>,<v1>,...,<vK>`, no header.
//!
//! Integer descriptors are written as plain integers and real descriptors with
//! exactly six fractional digits.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::FeatureError;
use crate::feature::{check_name, Descriptor, DescriptorKind, FeatureLayout, ImageFeature};

/// A store line that could not be parsed.
#[derive(Debug)]
pub struct SkippedLine {
    /// The first token of the line, usually the record name.
    pub name: String,
    /// One-based line number.
    pub line_number: usize,
    /// Why the line was rejected.
    pub error: FeatureError,
}

/// The records of a store and the lines that were rejected.
#[derive(Debug, Default)]
pub struct StoreContents {
    /// The well-formed records, in file order.
    pub features: Vec<ImageFeature>,
    /// The ill-formed lines.
    pub skipped: Vec<SkippedLine>,
}

impl StoreContents {
    /// The number of non-empty lines read.
    pub fn num_lines(&self) -> usize {
        self.features.len() + self.skipped.len()
    }
}

/// Render a record as a store line, without the line terminator.
///
/// # Errors
///
/// Returns [`FeatureError::InvalidName`] if the name is empty, contains a
/// comma or a line break, or starts or ends with whitespace.
///
/// # Example
///
/// ```
/// use cbir_features::Descriptor;
/// use cbir_features::store::serialize_line;
///
/// let line = serialize_line("a.jpg", &Descriptor::Real(vec![0.25, 1.0 / 3.0])).unwrap();
/// assert_eq!(line, "a.jpg,0.250000,0.333333");
///
/// let line = serialize_line("b.jpg", &Descriptor::Integer(vec![0, 255])).unwrap();
/// assert_eq!(line, "b.jpg,0,255");
/// ```
pub fn serialize_line(name: &str, descriptor: &Descriptor) -> Result<String, FeatureError> {
    check_name(name)?;

    let mut line = String::with_capacity(name.len() + descriptor.len() * 9);
    line.push_str(name);
    // writing to a String cannot fail
    match descriptor {
        Descriptor::Integer(values) => values.iter().for_each(|v| {
            let _ = write!(line, ",{v}");
        }),
        Descriptor::Real(values) => values.iter().for_each(|v| {
            let _ = write!(line, ",{v:.6}");
        }),
    }
    Ok(line)
}

/// Parse one store line against a layout.
///
/// Surrounding whitespace of every token is ignored.
///
/// # Errors
///
/// Returns [`FeatureError::Parse`] when the number of values differs from the
/// layout dimension and [`FeatureError::InvalidNumber`] when a value is not a
/// number of the layout's kind.
pub fn parse_line(line: &str, layout: &FeatureLayout) -> Result<ImageFeature, FeatureError> {
    let mut tokens = line.trim_end_matches(['\r', '\n']).split(',');
    let name = tokens.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(FeatureError::InvalidName(name.to_string()));
    }

    let values: Vec<&str> = tokens.map(str::trim).collect();
    if values.len() != layout.dimension() {
        return Err(FeatureError::Parse {
            expected: layout.dimension(),
            found: values.len(),
        });
    }

    let invalid = |index: usize, token: &str| FeatureError::InvalidNumber {
        index,
        token: token.to_string(),
        kind: layout.kind(),
    };

    let descriptor = match layout.kind() {
        DescriptorKind::Integer => Descriptor::Integer(
            values
                .iter()
                .enumerate()
                .map(|(i, t)| t.parse::<i32>().map_err(|_| invalid(i, t)))
                .collect::<Result<_, _>>()?,
        ),
        DescriptorKind::Real => Descriptor::Real(
            values
                .iter()
                .enumerate()
                .map(|(i, t)| match t.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(invalid(i, t)),
                })
                .collect::<Result<_, _>>()?,
        ),
    };

    ImageFeature::new(name, layout, descriptor)
}

/// Write records to a store, one line each, in the given order.
pub fn write<W: Write>(writer: W, features: &[ImageFeature]) -> Result<(), FeatureError> {
    let mut writer = BufWriter::new(writer);
    for feature in features {
        let line = serialize_line(feature.name(), feature.descriptor())?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every well-formed record of a store.
///
/// Blank lines are ignored. Ill-formed lines, including lines that are not
/// valid UTF-8, are logged and reported in [`StoreContents::skipped`]; only
/// I/O failures abort the read.
pub fn read<R: BufRead>(reader: R, layout: &FeatureLayout) -> Result<StoreContents, FeatureError> {
    let mut contents = StoreContents::default();
    for (i, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let name = String::from_utf8_lossy(&bytes)
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let parsed = String::from_utf8(bytes)
            .map_err(FeatureError::from)
            .and_then(|line| parse_line(&line, layout));
        match parsed {
            Ok(feature) => contents.features.push(feature),
            Err(error) => {
                log::warn!("skipping line {}: {error}", i + 1);
                contents.skipped.push(SkippedLine {
                    name,
                    line_number: i + 1,
                    error,
                });
            }
        }
    }
    Ok(contents)
}

/// Write records to a store file, replacing any previous content.
pub fn write_file(path: impl AsRef<Path>, features: &[ImageFeature]) -> Result<(), FeatureError> {
    write(File::create(path)?, features)
}

/// Read every well-formed record of a store file.
pub fn read_file(
    path: impl AsRef<Path>,
    layout: &FeatureLayout,
) -> Result<StoreContents, FeatureError> {
    read(BufReader::new(File::open(path)?), layout)
}
