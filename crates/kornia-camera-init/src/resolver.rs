//! Per-view intrinsic resolution.
//!
//! For a single view this module decides, from the best available evidence,
//! which intrinsic the view gets. It never touches shared state: the outcome is
//! handed to the coordinator, which commits it.
use std::collections::BTreeMap;

use crate::camera::{Intrinsic, IntrinsicId};
use crate::config::{CameraInitConfig, IntrinsicDefaults};
use crate::sensor_db::SensorDatabase;
use crate::view::View;

/// A camera (make, model) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorKey {
    /// Camera brand
    pub make: String,
    /// Camera model
    pub model: String,
}

impl SensorKey {
    /// Create a key from a make and model.
    pub fn new(make: &str, model: &str) -> Self {
        Self {
            make: make.to_string(),
            model: model.to_string(),
        }
    }
}

/// A per-view condition collected during resolution. Never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDiagnostic {
    /// Make and model are known but the sensor database has no width for them.
    UnknownSensor(SensorKey),
    /// The view has no make and model metadata.
    NoMetadata,
}

/// Which evidence produced the focal length of a new intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocalSource {
    /// Sensor width from the database and focal length from the metadata.
    Metadata,
    /// The configured default focal length in pixels.
    DefaultFocalLength,
    /// The configured default field of view.
    DefaultFieldOfView,
    /// Nothing was available, the focal length is unresolved.
    Unresolved,
}

/// What the resolver decided for one view.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The view references an intrinsic with a positive focal length.
    AlreadyResolved,
    /// The view references an intrinsic whose focal length is not set.
    ExistingUnresolved,
    /// A new intrinsic was built for the view.
    Resolved {
        /// The new intrinsic, before grouping
        intrinsic: Intrinsic,
        /// Evidence used for the focal length
        source: FocalSource,
    },
    /// The sensor is unknown and incomplete output is not allowed: no intrinsic.
    UnknownSensor,
    /// No metadata and incomplete output is allowed: the view is left without intrinsic.
    NoMetadata,
}

/// The resolution of one view together with its diagnostic, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    /// The decision
    pub resolution: Resolution,
    /// Condition to record in the diagnostics ledger
    pub diagnostic: Option<RecordDiagnostic>,
}

impl RecordOutcome {
    fn new(resolution: Resolution, diagnostic: Option<RecordDiagnostic>) -> Self {
        Self {
            resolution,
            diagnostic,
        }
    }
}

/// Resolve the intrinsic of a single view.
///
/// # Arguments
///
/// * `view` - The view to resolve.
/// * `existing` - Intrinsics already present in the dataset.
/// * `sensor_db` - The sensor width table.
/// * `config` - The run configuration.
pub fn resolve_view(
    view: &View,
    existing: &BTreeMap<IntrinsicId, Intrinsic>,
    sensor_db: &SensorDatabase,
    config: &CameraInitConfig,
) -> RecordOutcome {
    let camera_metadata = view.camera_metadata();
    let unknown_sensor = camera_metadata
        .filter(|(make, model)| sensor_db.find(make, model).is_none())
        .map(|(make, model)| RecordDiagnostic::UnknownSensor(SensorKey::new(make, model)));

    // an existing intrinsic is never rebuilt
    if let Some(intrinsic) = view.intrinsic_id.and_then(|id| existing.get(&id)) {
        if intrinsic.is_initialized() {
            return RecordOutcome::new(Resolution::AlreadyResolved, None);
        }
        return RecordOutcome::new(Resolution::ExistingUnresolved, unknown_sensor);
    }

    let mut sensor_width = None;
    let mut diagnostic = None;
    match camera_metadata {
        Some((make, model)) => match sensor_db.find(make, model) {
            Some(width) => sensor_width = Some(width),
            None => {
                if !config.allow_incomplete_output {
                    return RecordOutcome::new(Resolution::UnknownSensor, unknown_sensor);
                }
                diagnostic = unknown_sensor;
            }
        },
        None => {
            if config.allow_incomplete_output {
                return RecordOutcome::new(
                    Resolution::NoMetadata,
                    Some(RecordDiagnostic::NoMetadata),
                );
            }
            // still try the defaults, they may be enough
            diagnostic = Some(RecordDiagnostic::NoMetadata);
        }
    }

    let (intrinsic, source) = build_intrinsic(view, sensor_width, &config.defaults);
    RecordOutcome::new(Resolution::Resolved { intrinsic, source }, diagnostic)
}

/// Build a new intrinsic for a view.
///
/// The focal length comes, in priority order, from the sensor width combined
/// with the metadata focal length, from the default focal length, from the
/// default field of view, or stays unresolved.
pub fn build_intrinsic(
    view: &View,
    sensor_width_mm: Option<f64>,
    defaults: &IntrinsicDefaults,
) -> (Intrinsic, FocalSource) {
    let width = view.width as f64;
    let height = view.height as f64;

    let from_metadata = sensor_width_mm
        .zip(view.focal_length_mm())
        .map(|(sensor_width, focal_mm)| width.max(height) * focal_mm / sensor_width)
        .filter(|f| is_valid_focal(*f));

    let from_fov = defaults
        .field_of_view_deg
        .map(|fov| (width / 2.0) / (fov.to_radians() / 2.0).tan())
        .filter(|f| is_valid_focal(*f));

    let (focal, source) = if let Some(f) = from_metadata {
        (Some(f), FocalSource::Metadata)
    } else if let Some(f) = defaults.focal_length_pix.filter(|f| is_valid_focal(*f)) {
        (Some(f), FocalSource::DefaultFocalLength)
    } else if let Some(f) = from_fov {
        (Some(f), FocalSource::DefaultFieldOfView)
    } else {
        (None, FocalSource::Unresolved)
    };

    let principal_point = defaults
        .principal_point
        .unwrap_or((width / 2.0, height / 2.0));

    let mut intrinsic = Intrinsic::new(
        defaults.camera_model,
        view.width,
        view.height,
        focal,
        principal_point,
    );
    if let Some(serial) = view.device_serial() {
        intrinsic = intrinsic.with_serial_number(serial);
    }

    (intrinsic, source)
}

fn is_valid_focal(f: f64) -> bool {
    f.is_finite() && f > 0.0
}
