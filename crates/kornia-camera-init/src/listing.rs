use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::CameraInitError;
use crate::exif::read_image_metadata;
use crate::view::View;

/// Image extensions looked up by default.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "exr"];

/// Recursively list the images of a folder, or check a single image path.
///
/// Extensions are compared case-insensitively. The result is sorted.
pub fn list_images(
    folder_or_file: impl AsRef<Path>,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, CameraInitError> {
    let root = folder_or_file.as_ref();

    let mut images = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    if images.is_empty() {
        return Err(CameraInitError::InvalidInputPath(root.to_path_buf()));
    }

    images.sort();
    Ok(images)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
}

/// Build a view from an image file.
///
/// The dimensions come from the image header, or from the EXIF pixel
/// dimensions when the format cannot be probed.
pub fn read_view(path: impl AsRef<Path>) -> Result<View, CameraInitError> {
    let path = path.as_ref();
    let metadata = read_image_metadata(path)?;

    let (width, height) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            log::debug!("cannot probe {}: {}", path.display(), e);
            metadata
                .pixel_dimensions
                .ok_or_else(|| CameraInitError::ImageDimensions(path.to_path_buf()))?
        }
    };

    let mut view = View::new(path, width, height);
    view.metadata = metadata.into_map();
    Ok(view)
}

/// Build the views of a list of images in parallel.
pub fn views_from_images(paths: &[PathBuf]) -> Result<Vec<View>, CameraInitError> {
    paths.par_iter().map(|path| read_view(path)).collect()
}
