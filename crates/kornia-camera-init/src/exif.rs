use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;

use crate::error::CameraInitError;
use crate::view::{
    BODY_SERIAL_KEY, FOCAL_LENGTH_35MM_KEY, FOCAL_LENGTH_KEY, LENS_SERIAL_KEY, MAKE_KEY,
    MODEL_KEY,
};

const HEADER_READ_SIZE: usize = 128 * 1024;

/// Device metadata found in the EXIF block of an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    /// Camera brand
    pub make: Option<String>,
    /// Camera model
    pub model: Option<String>,
    /// Lens focal length in millimetres
    pub focal_length_mm: Option<f64>,
    /// Focal length equivalent on a 35mm film
    pub focal_length_35mm: Option<u32>,
    /// Image dimensions recorded by the camera (width, height)
    pub pixel_dimensions: Option<(u32, u32)>,
    /// Camera body serial number
    pub body_serial: Option<String>,
    /// Lens serial number
    pub lens_serial: Option<String>,
}

impl ImageMetadata {
    /// Convert into the key/value map stored on a view.
    pub fn into_map(self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut insert = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };
        insert(MAKE_KEY, self.make);
        insert(MODEL_KEY, self.model);
        insert(FOCAL_LENGTH_KEY, self.focal_length_mm.map(|f| f.to_string()));
        insert(
            FOCAL_LENGTH_35MM_KEY,
            self.focal_length_35mm.map(|f| f.to_string()),
        );
        insert(BODY_SERIAL_KEY, self.body_serial);
        insert(LENS_SERIAL_KEY, self.lens_serial);
        map
    }
}

/// Read the device metadata of an image file without decoding pixels.
///
/// A file without EXIF data, or with a format that carries none, yields an
/// empty [`ImageMetadata`].
///
/// # Arguments
///
/// * `path` - Path to the image file (JPEG, TIFF or PNG).
pub fn read_image_metadata(path: impl AsRef<Path>) -> Result<ImageMetadata, CameraInitError> {
    let path = path.as_ref();

    let Some(file_type) = exif_file_type(path) else {
        return Ok(ImageMetadata::default());
    };

    let mut file = File::open(path)?;
    let mut buffer = vec![0; HEADER_READ_SIZE];
    let n = file.read(&mut buffer)?;
    buffer.truncate(n);

    // TIFF directories may point anywhere in the file
    if n == HEADER_READ_SIZE {
        file.read_to_end(&mut buffer)?;
    }

    match Metadata::new_from_vec(&buffer, file_type) {
        Ok(metadata) => Ok(metadata_from_exif(&metadata)),
        Err(e) => {
            log::debug!("no EXIF data in {}: {}", path.display(), e);
            Ok(ImageMetadata::default())
        }
    }
}

// File type must be determined from extension
fn exif_file_type(path: &Path) -> Option<FileExtension> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => Some(FileExtension::JPEG),
        Some("tif") | Some("tiff") => Some(FileExtension::TIFF),
        Some("png") => Some(FileExtension::PNG {
            as_zTXt_chunk: false,
        }),
        _ => None,
    }
}

fn metadata_from_exif(metadata: &Metadata) -> ImageMetadata {
    let width = find_tag(metadata, ExifTag::ExifImageWidth(Vec::new()), |tag| match tag {
        ExifTag::ExifImageWidth(values) => values.first().map(|&v| v as u32),
        _ => None,
    });
    let height = find_tag(metadata, ExifTag::ExifImageHeight(Vec::new()), |tag| match tag {
        ExifTag::ExifImageHeight(values) => values.first().map(|&v| v as u32),
        _ => None,
    });

    ImageMetadata {
        make: find_tag(metadata, ExifTag::Make(String::new()), |tag| match tag {
            ExifTag::Make(value) => clean_ascii(value),
            _ => None,
        }),
        model: find_tag(metadata, ExifTag::Model(String::new()), |tag| match tag {
            ExifTag::Model(value) => clean_ascii(value),
            _ => None,
        }),
        focal_length_mm: find_tag(metadata, ExifTag::FocalLength(Vec::new()), |tag| match tag {
            ExifTag::FocalLength(values) => values
                .first()
                .filter(|r| r.denominator != 0)
                .map(|r| r.nominator as f64 / r.denominator as f64),
            _ => None,
        }),
        focal_length_35mm: find_tag(
            metadata,
            ExifTag::FocalLengthIn35mmFormat(Vec::new()),
            |tag| match tag {
                ExifTag::FocalLengthIn35mmFormat(values) => values.first().map(|&v| v as u32),
                _ => None,
            },
        ),
        pixel_dimensions: width.zip(height),
        body_serial: find_tag(metadata, ExifTag::SerialNumber(String::new()), |tag| match tag {
            ExifTag::SerialNumber(value) => clean_ascii(value),
            _ => None,
        }),
        lens_serial: find_tag(
            metadata,
            ExifTag::LensSerialNumber(String::new()),
            |tag| match tag {
                ExifTag::LensSerialNumber(value) => clean_ascii(value),
                _ => None,
            },
        ),
    }
}

fn find_tag<T>(
    metadata: &Metadata,
    query: ExifTag,
    extract: impl Fn(&ExifTag) -> Option<T>,
) -> Option<T> {
    metadata.get_tag(&query).into_iter().find_map(extract)
}

// ASCII fields are NUL padded.
fn clean_ascii(value: &str) -> Option<String> {
    let value = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!value.is_empty()).then(|| value.to_string())
}
