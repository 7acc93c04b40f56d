#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Camera Init
//!
//! Initializes the camera intrinsics of an image dataset before structure-from-motion.
//!
//! ## Key Features
//!
//! - **Tiered resolution**: focal length from the sensor database and the image
//!   metadata, then from the configured defaults
//! - **Grouping**: views share an intrinsic by metadata, by folder or by rig camera
//! - **Parallel pass**: deterministic result whatever the scheduling order
//! - **Diagnostics**: images without metadata and cameras missing from the database
//!
//! ## Example
//!
//! ```rust
//! use kornia_camera_init::{
//!     run, CameraInitConfig, Datasheet, SensorDatabase, SfmData, View,
//! };
//!
//! let db = SensorDatabase::new([Datasheet::new("Acme", "X1", 23.5)]);
//!
//! let views = ["a.jpg", "b.jpg"].map(|name| {
//!     View::new(format!("shoot1/{}", name), 4000, 3000)
//!         .with_metadata("Make", "Acme")
//!         .with_metadata("Model", "X1")
//!         .with_metadata("FocalLength", "23.5")
//! });
//! let mut sfm_data = SfmData::from_views(views);
//!
//! let report = run(&mut sfm_data, &db, &CameraInitConfig::default())?;
//! report.ensure_accepted()?;
//! assert_eq!(sfm_data.intrinsics.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Camera model families and intrinsic parameters.
pub mod camera;

/// Configuration of a camera initialization run.
pub mod config;

/// Parallel resolution pass and acceptance gate.
pub mod coordinator;

/// Dataset of views and intrinsics.
pub mod dataset;

/// Error types for the crate.
pub mod error;

/// EXIF device metadata extraction.
pub mod exif;

/// Grouping of views into shared intrinsics.
pub mod grouping;

/// Stable hashing for persisted identifiers.
pub mod hash;

/// Diagnostics collected during a pass.
pub mod ledger;

/// Image discovery and view construction.
pub mod listing;

/// Per-view intrinsic resolution.
pub mod resolver;

/// Sensor width database.
pub mod sensor_db;

/// Captured images and their metadata.
pub mod view;

pub use camera::{CameraModel, Intrinsic, IntrinsicId};
pub use config::{parse_k_matrix, CameraInitConfig, GroupingMode, IntrinsicDefaults};
pub use coordinator::{evaluate_acceptance, run, Acceptance, CameraInitReport, RejectReason};
pub use dataset::SfmData;
pub use error::CameraInitError;
pub use ledger::DiagnosticsLedger;
pub use listing::{list_images, read_view, views_from_images, DEFAULT_IMAGE_EXTENSIONS};
pub use resolver::{FocalSource, RecordDiagnostic, RecordOutcome, Resolution, SensorKey};
pub use sensor_db::{parse_sensor_database, read_sensor_database, Datasheet, SensorDatabase};
pub use view::{RigMembership, View, ViewId};
