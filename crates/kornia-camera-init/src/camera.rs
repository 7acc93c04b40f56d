//! Camera model families and the intrinsic parameter set built for a view.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CameraInitError;
use crate::hash::StableHasher;

/// Identifier of an intrinsic inside a dataset.
pub type IntrinsicId = u64;

/// Supported projective camera model families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraModel {
    /// Pinhole camera without distortion
    #[default]
    Pinhole,
    /// Pinhole with one radial distortion coefficient
    Radial1,
    /// Pinhole with three radial distortion coefficients
    Radial3,
    /// Brown-Conrady model, three radial and two tangential coefficients
    Brown,
    /// Fisheye with four coefficients
    Fisheye4,
    /// Fisheye with a single field-of-view coefficient
    Fisheye1,
}

impl CameraModel {
    /// Lowercase name used in configuration and dataset files.
    pub fn name(&self) -> &'static str {
        match self {
            CameraModel::Pinhole => "pinhole",
            CameraModel::Radial1 => "radial1",
            CameraModel::Radial3 => "radial3",
            CameraModel::Brown => "brown",
            CameraModel::Fisheye4 => "fisheye4",
            CameraModel::Fisheye1 => "fisheye1",
        }
    }

    /// Number of distortion parameters the family carries.
    pub fn num_distortion_params(&self) -> usize {
        match self {
            CameraModel::Pinhole => 0,
            CameraModel::Radial1 => 1,
            CameraModel::Radial3 => 3,
            CameraModel::Brown => 5,
            CameraModel::Fisheye4 => 4,
            CameraModel::Fisheye1 => 1,
        }
    }

    fn tag(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for CameraModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CameraModel {
    type Err = CameraInitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pinhole" => Ok(CameraModel::Pinhole),
            "radial1" => Ok(CameraModel::Radial1),
            "radial3" => Ok(CameraModel::Radial3),
            "brown" => Ok(CameraModel::Brown),
            "fisheye4" => Ok(CameraModel::Fisheye4),
            "fisheye1" => Ok(CameraModel::Fisheye1),
            _ => Err(CameraInitError::InvalidCameraModel(s.to_string())),
        }
    }
}

/// The intrinsic parameters of a camera, as initialized from metadata or defaults.
///
/// A `None` focal length marks an intrinsic that exists but could not be
/// resolved; this is distinct from a view having no intrinsic at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsic {
    /// Camera model family
    pub model: CameraModel,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Initial focal length in pixels
    pub focal_length_pix: Option<f64>,
    /// Principal point in pixels (x, y)
    pub principal_point: (f64, f64),
    /// Serial number tag, used to keep apart devices with identical parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

impl Intrinsic {
    /// Create a new intrinsic without serial number.
    pub fn new(
        model: CameraModel,
        width: u32,
        height: u32,
        focal_length_pix: Option<f64>,
        principal_point: (f64, f64),
    ) -> Self {
        Self {
            model,
            width,
            height,
            focal_length_pix: focal_length_pix.filter(|f| f.is_finite() && *f > 0.0),
            principal_point,
            serial_number: None,
        }
    }

    /// Return a copy tagged with the given serial number.
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Whether the focal length is known and positive.
    pub fn is_initialized(&self) -> bool {
        self.focal_length_pix.is_some_and(|f| f > 0.0)
    }

    /// Hash of the numeric parameters and serial tag.
    ///
    /// Two intrinsics with equal content always hash identically, in any process.
    pub fn identity_hash(&self) -> IntrinsicId {
        let mut h = StableHasher::new();
        h.write_u8(self.model.tag());
        h.write_u32(self.width);
        h.write_u32(self.height);
        match self.focal_length_pix {
            Some(f) => {
                h.write_u8(1);
                h.write_f64(f);
            }
            None => h.write_u8(0),
        }
        h.write_f64(self.principal_point.0);
        h.write_f64(self.principal_point.1);
        match &self.serial_number {
            Some(serial) => {
                h.write_u8(1);
                h.write_str(serial);
            }
            None => h.write_u8(0),
        }
        h.finish_id()
    }
}
