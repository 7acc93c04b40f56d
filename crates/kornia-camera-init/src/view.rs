use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::IntrinsicId;
use crate::hash::StableHasher;

/// Identifier of a view inside a dataset.
pub type ViewId = u64;

/// Metadata key of the camera brand.
pub const MAKE_KEY: &str = "Make";
/// Metadata key of the camera model.
pub const MODEL_KEY: &str = "Model";
/// Metadata key of the lens focal length in millimetres.
pub const FOCAL_LENGTH_KEY: &str = "FocalLength";
/// Metadata key of the 35mm-equivalent focal length.
pub const FOCAL_LENGTH_35MM_KEY: &str = "FocalLengthIn35mmFormat";
/// Metadata key of the camera body serial number.
pub const BODY_SERIAL_KEY: &str = "BodySerialNumber";
/// Metadata key of the lens serial number.
pub const LENS_SERIAL_KEY: &str = "LensSerialNumber";

/// Membership of a view in a multi-camera rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RigMembership {
    /// Rig identifier
    pub rig_id: u32,
    /// Camera position inside the rig
    pub sub_pose_id: u32,
}

/// One captured image and everything known about it before reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// View identifier
    pub view_id: ViewId,
    /// Path of the image file
    pub image_path: PathBuf,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Device metadata as key/value strings
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Rig membership, if the image was taken by a rig camera
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig: Option<RigMembership>,
    /// Intrinsic reference, `None` when undefined
    #[serde(default)]
    pub intrinsic_id: Option<IntrinsicId>,
}

impl View {
    /// Create a view with an id derived from its path and dimensions.
    pub fn new(image_path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        let image_path = image_path.into();
        let mut h = StableHasher::new();
        h.write_str(&image_path.to_string_lossy());
        h.write_u32(width);
        h.write_u32(height);
        Self {
            view_id: h.finish_id(),
            image_path,
            width,
            height,
            metadata: BTreeMap::new(),
            rig: None,
            intrinsic_id: None,
        }
    }

    /// Builder helper to set a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builder helper to set the rig membership.
    pub fn with_rig(mut self, rig_id: u32, sub_pose_id: u32) -> Self {
        self.rig = Some(RigMembership {
            rig_id,
            sub_pose_id,
        });
        self
    }

    /// Builder helper to set the intrinsic reference.
    pub fn with_intrinsic_id(mut self, intrinsic_id: IntrinsicId) -> Self {
        self.intrinsic_id = Some(intrinsic_id);
        self
    }

    /// Trimmed metadata value, `None` when absent or blank.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The (make, model) pair, only when both are present.
    pub fn camera_metadata(&self) -> Option<(&str, &str)> {
        Some((self.metadata_value(MAKE_KEY)?, self.metadata_value(MODEL_KEY)?))
    }

    /// Whether both make and model metadata are present.
    pub fn has_camera_metadata(&self) -> bool {
        self.camera_metadata().is_some()
    }

    /// Focal length in millimetres read from the metadata.
    pub fn focal_length_mm(&self) -> Option<f64> {
        self.metadata_value(FOCAL_LENGTH_KEY)?
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
    }

    /// Body and lens serial numbers joined, if any is present.
    pub fn device_serial(&self) -> Option<String> {
        let parts = [BODY_SERIAL_KEY, LENS_SERIAL_KEY]
            .iter()
            .filter_map(|key| self.metadata_value(key))
            .collect::<Vec<_>>();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("_"))
        }
    }

    /// Folder containing the image.
    pub fn parent_folder(&self) -> &Path {
        self.image_path.parent().unwrap_or_else(|| Path::new(""))
    }
}
