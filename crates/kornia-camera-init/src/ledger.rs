use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::resolver::{RecordDiagnostic, SensorKey};
use crate::view::ViewId;

/// Diagnostics aggregated over one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsLedger {
    /// Views without make/model metadata and their image paths
    pub no_metadata: BTreeMap<ViewId, PathBuf>,
    /// Cameras missing from the sensor database, with one example image each
    pub unknown_sensors: BTreeMap<SensorKey, PathBuf>,
    /// Number of views with an initialized intrinsic
    pub complete_views: usize,
}

impl DiagnosticsLedger {
    /// Record the diagnostic of one view.
    ///
    /// For unknown sensors the first recorded path is kept.
    pub fn record(&mut self, view_id: ViewId, image_path: &Path, diagnostic: &RecordDiagnostic) {
        match diagnostic {
            RecordDiagnostic::NoMetadata => {
                self.no_metadata.insert(view_id, image_path.to_path_buf());
            }
            RecordDiagnostic::UnknownSensor(key) => {
                self.unknown_sensors
                    .entry(key.clone())
                    .or_insert_with(|| image_path.to_path_buf());
            }
        }
    }

    /// Whether any camera is missing from the sensor database.
    pub fn has_unknown_sensors(&self) -> bool {
        !self.unknown_sensors.is_empty()
    }

    /// Log the collected diagnostics.
    pub fn log_report(&self) {
        if !self.no_metadata.is_empty() {
            log::warn!("No metadata in image(s):");
            for path in self.no_metadata.values() {
                log::warn!("\t- '{}'", path.display());
            }
        }

        if !self.unknown_sensors.is_empty() {
            log::error!("Sensor width doesn't exist in the database for image(s):");
            for (key, path) in &self.unknown_sensors {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                log::error!(
                    "image: '{}'\n\t- camera brand: {}\n\t- camera model: {}",
                    name,
                    key.make,
                    key.model
                );
            }
            log::error!("Please add camera model(s) and sensor width(s) in the database.");
        }
    }
}
