use std::path::{Path, PathBuf};

use crate::error::IoError;

/// File extensions (lowercase, without the dot) accepted as images.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "ppm", "tif", "tiff"];

/// Whether the path carries one of the [`IMAGE_EXTENSIONS`], compared case-insensitively.
///
/// # Example
///
/// ```
/// use cbir_io::dir::is_image_file;
///
/// assert!(is_image_file("pic.0001.JPG"));
/// assert!(is_image_file("scan.tif"));
/// assert!(!is_image_file("notes.txt"));
/// assert!(!is_image_file("jpg"));
/// ```
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// An image file found in a directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageEntry {
    /// The file name, used as the record name in descriptor stores.
    pub name: String,
    /// The full path to the file.
    pub path: PathBuf,
}

/// List the image files of a directory, sorted by file name.
///
/// Sub-directories and files without an image extension are ignored; the
/// directory is not walked recursively. File names that are not valid UTF-8
/// are skipped with a warning.
///
/// # Errors
///
/// Returns [`IoError::DirectoryNotReadable`] when the directory cannot be opened.
pub fn list_image_files(dir: impl AsRef<Path>) -> Result<Vec<ImageEntry>, IoError> {
    let dir = dir.as_ref();
    let read_dir =
        std::fs::read_dir(dir).map_err(|e| IoError::DirectoryNotReadable(dir.to_path_buf(), e))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_image_file(&path) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => entries.push(ImageEntry { name, path }),
            Err(name) => log::warn!("skipping non UTF-8 file name {:?}", name),
        }
    }

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use crate::error::IoError;

    #[test]
    fn list_filters_and_sorts() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        for name in ["b.png", "a.JPG", "c.txt", "d.tif", "e.ppm"] {
            std::fs::write(tmp_dir.path().join(name), b"")?;
        }
        std::fs::create_dir(tmp_dir.path().join("nested.png"))?;

        let entries = super::list_image_files(tmp_dir.path())?;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "d.tif", "e.ppm"]);
        assert_eq!(entries[1].path, tmp_dir.path().join("b.png"));
        Ok(())
    }

    #[test]
    fn list_missing_directory() {
        let res = super::list_image_files("no/such/directory");
        assert!(matches!(res, Err(IoError::DirectoryNotReadable(_, _))));
    }
}
