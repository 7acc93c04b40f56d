use std::path::PathBuf;

use crate::coordinator::RejectReason;

/// Errors that can occur while initializing camera intrinsics.
#[derive(Debug, thiserror::Error)]
pub enum CameraInitError {
    /// Error reading or writing a file.
    #[error("Failed to read or write the file. {0}")]
    IoError(#[from] std::io::Error),

    /// Error (de)serializing the dataset file.
    #[error("Invalid dataset file. {0}")]
    JsonError(#[from] serde_json::Error),

    /// A line of the sensor database could not be parsed.
    #[error("sensor database line {line}: {reason}")]
    SensorDatabaseParse {
        /// 1-based line number in the database text.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The camera model name is not one of the supported families.
    #[error("unknown camera model '{0}' (expected pinhole, radial1, radial3, brown, fisheye4 or fisheye1)")]
    InvalidCameraModel(String),

    /// The default intrinsic string is not a valid `f;0;ppx;0;f;ppy;0;0;1` matrix.
    #[error("invalid K matrix '{0}', expected \"f;0;ppx;0;f;ppy;0;0;1\"")]
    InvalidKMatrix(String),

    /// Two mutually exclusive default intrinsic options were supplied together.
    #[error("cannot combine {0} and {1}")]
    ConfigurationConflict(&'static str, &'static str),

    /// The grouping mode is not 0, 1 or 2.
    #[error("invalid grouping mode {0}, expected 0, 1 or 2")]
    InvalidGroupingMode(u8),

    /// The default field of view is outside the open interval (0, 180) degrees.
    #[error("invalid field of view {0} degrees")]
    InvalidFieldOfView(f64),

    /// The dataset holds no views.
    #[error("can't find views in input")]
    NoViews,

    /// The image dimensions could not be read from the file header or its metadata.
    #[error("cannot read the dimensions of image {0}")]
    ImageDimensions(PathBuf),

    /// The input path is neither a supported image nor a folder holding one.
    #[error("'{0}' is not a valid folder or image path")]
    InvalidInputPath(PathBuf),

    /// The resolution pass completed but its result is not usable.
    #[error("camera initialization rejected: {0}")]
    AcceptanceFailure(RejectReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_cause() {
        let io = CameraInitError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "sensors.txt",
        ));
        assert!(io.to_string().ends_with("sensors.txt"));

        let json = serde_json::from_str::<u32>("{")
            .map_err(CameraInitError::from)
            .unwrap_err();
        let message = json.to_string();
        assert!(message.starts_with("Invalid dataset file. "));
        assert!(message.len() > "Invalid dataset file. ".len());
    }
}
