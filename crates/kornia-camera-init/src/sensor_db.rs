use std::{collections::HashMap, fs, path::Path};

use crate::error::CameraInitError;

/// A camera body and the physical width of its sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Datasheet {
    /// Camera brand
    pub make: String,
    /// Camera model
    pub model: String,
    /// Sensor width in millimetres
    pub sensor_width_mm: f64,
}

impl Datasheet {
    /// Create a datasheet, trimming the make and model.
    pub fn new(make: &str, model: &str, sensor_width_mm: f64) -> Self {
        Self {
            make: make.trim().to_string(),
            model: model.trim().to_string(),
            sensor_width_mm,
        }
    }
}

/// Read-only table of sensor widths indexed by (make, model).
#[derive(Debug, Clone, Default)]
pub struct SensorDatabase {
    entries: HashMap<(String, String), f64>,
}

impl SensorDatabase {
    /// Build the table from datasheets. Later duplicates are ignored.
    pub fn new(datasheets: impl IntoIterator<Item = Datasheet>) -> Self {
        let mut entries = HashMap::new();
        for sheet in datasheets {
            entries
                .entry((sheet.make, sheet.model))
                .or_insert(sheet.sensor_width_mm);
        }
        Self { entries }
    }

    /// Number of datasheets in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sensor width in millimetres for the given camera.
    ///
    /// Matching is an exact, case-sensitive comparison of the trimmed strings.
    pub fn find(&self, make: &str, model: &str) -> Option<f64> {
        self.entries
            .get(&(make.trim().to_string(), model.trim().to_string()))
            .copied()
    }
}

/// Parse a sensor database from its text form.
///
/// Each line reads `make;model;sensor_width_mm`, optionally followed by more
/// `;`-separated fields which are ignored. Blank lines and `#` comments are skipped.
pub fn parse_sensor_database(text: &str) -> Result<SensorDatabase, CameraInitError> {
    let datasheets = text
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| parse_datasheet_line(i + 1, line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SensorDatabase::new(datasheets))
}

/// Read and parse a sensor database file.
pub fn read_sensor_database(path: impl AsRef<Path>) -> Result<SensorDatabase, CameraInitError> {
    let text = fs::read_to_string(path)?;
    let db = parse_sensor_database(&text)?;
    log::debug!("loaded {} sensor datasheets", db.len());
    Ok(db)
}

fn parse_datasheet_line(line_number: usize, line: &str) -> Result<Datasheet, CameraInitError> {
    let parse_error = |reason: String| CameraInitError::SensorDatabaseParse {
        line: line_number,
        reason,
    };

    let parts = line.split(';').map(str::trim).collect::<Vec<_>>();
    if parts.len() < 3 {
        return Err(parse_error(format!(
            "expected at least 3 fields, found {}",
            parts.len()
        )));
    }
    if parts[0].is_empty() || parts[1].is_empty() {
        return Err(parse_error("empty make or model".to_string()));
    }

    let width = parts[2]
        .parse::<f64>()
        .map_err(|e| parse_error(format!("{}: {}", parts[2], e)))?;
    if !width.is_finite() || width <= 0.0 {
        return Err(parse_error(format!("invalid sensor width {}", width)));
    }

    Ok(Datasheet::new(parts[0], parts[1], width))
}
