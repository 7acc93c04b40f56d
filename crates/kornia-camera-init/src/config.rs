use crate::camera::CameraModel;
use crate::error::CameraInitError;

/// How views are grouped to share intrinsics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingMode {
    /// Each view gets its own intrinsic.
    PerView = 0,
    /// Views share an intrinsic based on metadata, otherwise each view has its own.
    MetadataOrPerView = 1,
    /// Views share an intrinsic based on metadata, otherwise they are grouped by folder.
    #[default]
    MetadataOrFolder = 2,
}

impl TryFrom<u8> for GroupingMode {
    type Error = CameraInitError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GroupingMode::PerView),
            1 => Ok(GroupingMode::MetadataOrPerView),
            2 => Ok(GroupingMode::MetadataOrFolder),
            _ => Err(CameraInitError::InvalidGroupingMode(value)),
        }
    }
}

/// Values used when the metadata is not enough to build an intrinsic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntrinsicDefaults {
    /// Focal length in pixels
    pub focal_length_pix: Option<f64>,
    /// Horizontal field of view in degrees
    pub field_of_view_deg: Option<f64>,
    /// Camera model family of the new intrinsics
    pub camera_model: CameraModel,
    /// Principal point in pixels, the image center when unset
    pub principal_point: Option<(f64, f64)>,
}

impl IntrinsicDefaults {
    /// Build the defaults from raw front-end options.
    ///
    /// Non-positive numbers mean "unset". The K matrix provides both the focal
    /// length and the principal point, so it cannot be combined with an explicit
    /// focal length or field of view, and those two exclude each other.
    pub fn from_options(
        focal_length_pix: Option<f64>,
        field_of_view_deg: Option<f64>,
        k_matrix: Option<&str>,
        camera_model: Option<&str>,
    ) -> Result<Self, CameraInitError> {
        let focal_length_pix = focal_length_pix.filter(|f| *f > 0.0);
        let field_of_view_deg = field_of_view_deg.filter(|f| *f > 0.0);
        let k_matrix = k_matrix.map(str::trim).filter(|k| !k.is_empty());

        if k_matrix.is_some() && focal_length_pix.is_some() {
            return Err(CameraInitError::ConfigurationConflict(
                "default intrinsic",
                "default focal length",
            ));
        }
        if k_matrix.is_some() && field_of_view_deg.is_some() {
            return Err(CameraInitError::ConfigurationConflict(
                "default intrinsic",
                "default field of view",
            ));
        }

        let camera_model = match camera_model.map(str::trim).filter(|m| !m.is_empty()) {
            Some(name) => name.parse()?,
            None => CameraModel::default(),
        };

        let mut defaults = Self {
            focal_length_pix,
            field_of_view_deg,
            camera_model,
            principal_point: None,
        };

        if let Some(k) = k_matrix {
            let (focal, ppx, ppy) = parse_k_matrix(k)?;
            defaults.focal_length_pix = Some(focal).filter(|f| *f > 0.0);
            if ppx > 0.0 && ppy > 0.0 {
                defaults.principal_point = Some((ppx, ppy));
            }
        }

        defaults.validate()?;
        Ok(defaults)
    }

    /// Check that the defaults are consistent.
    pub fn validate(&self) -> Result<(), CameraInitError> {
        if self.focal_length_pix.is_some() && self.field_of_view_deg.is_some() {
            return Err(CameraInitError::ConfigurationConflict(
                "default focal length",
                "default field of view",
            ));
        }
        if let Some(fov) = self.field_of_view_deg {
            if !(fov > 0.0 && fov < 180.0) {
                return Err(CameraInitError::InvalidFieldOfView(fov));
            }
        }
        Ok(())
    }
}

/// Parse a `f;0;ppx;0;f;ppy;0;0;1` matrix string.
///
/// Returns the focal length and the principal point (x, y).
pub fn parse_k_matrix(k: &str) -> Result<(f64, f64, f64), CameraInitError> {
    let values = k
        .split(';')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CameraInitError::InvalidKMatrix(k.to_string()))?;

    if values.len() != 9 {
        return Err(CameraInitError::InvalidKMatrix(k.to_string()));
    }

    Ok((values[0], values[2], values[5]))
}

/// Configuration of a camera initialization run.
#[derive(Debug, Clone, Default)]
pub struct CameraInitConfig {
    /// Grouping policy
    pub grouping: GroupingMode,
    /// Accept a result where some views have no initialized intrinsic
    pub allow_incomplete_output: bool,
    /// Accept a result with a single initialized view
    pub allow_single_view: bool,
    /// Default intrinsic values
    pub defaults: IntrinsicDefaults,
}

impl CameraInitConfig {
    /// Check the configuration before a run.
    pub fn validate(&self) -> Result<(), CameraInitError> {
        self.defaults.validate()
    }
}
