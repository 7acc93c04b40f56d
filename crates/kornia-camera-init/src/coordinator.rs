//! Parallel resolution pass over a dataset and its acceptance gate.
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::camera::{Intrinsic, IntrinsicId};
use crate::config::CameraInitConfig;
use crate::dataset::SfmData;
use crate::error::CameraInitError;
use crate::grouping::group_key;
use crate::ledger::DiagnosticsLedger;
use crate::resolver::{resolve_view, Resolution};
use crate::sensor_db::SensorDatabase;
use crate::view::ViewId;

/// Why a completed pass is not usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Some cameras are missing from the sensor database.
    UnknownSensors(usize),
    /// Not enough views have an initialized intrinsic.
    NotEnoughViews {
        /// Views with an initialized intrinsic
        complete: usize,
        /// Views required
        required: usize,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownSensors(n) => {
                write!(f, "{} camera(s) missing from the sensor database", n)
            }
            RejectReason::NotEnoughViews { complete, required } => write!(
                f,
                "at least {} image(s) should have an initialized intrinsic, found {}",
                required, complete
            ),
        }
    }
}

/// Final decision of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acceptance {
    /// The dataset can be used downstream.
    Accepted,
    /// The dataset is incomplete.
    Rejected(RejectReason),
}

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct CameraInitReport {
    /// Diagnostics collected during the pass
    pub diagnostics: DiagnosticsLedger,
    /// Number of views in the dataset
    pub num_views: usize,
    /// Number of intrinsics in the dataset after the pass
    pub num_intrinsics: usize,
    /// The acceptance decision
    pub acceptance: Acceptance,
}

impl CameraInitReport {
    /// Whether the pass was accepted.
    pub fn is_accepted(&self) -> bool {
        self.acceptance == Acceptance::Accepted
    }

    /// Turn a rejection into an error.
    pub fn ensure_accepted(&self) -> Result<(), CameraInitError> {
        match &self.acceptance {
            Acceptance::Accepted => Ok(()),
            Acceptance::Rejected(reason) => {
                Err(CameraInitError::AcceptanceFailure(reason.clone()))
            }
        }
    }

    /// Log the summary of the pass.
    pub fn log_summary(&self) {
        log::info!(
            "CameraInit report:\n\
             \t- # views listed: {}\n\
             \t- # views with an initialized intrinsic listed: {}\n\
             \t- # intrinsics listed: {}",
            self.num_views,
            self.diagnostics.complete_views,
            self.num_intrinsics
        );
    }
}

// Shared state of a pass, only mutated inside the commit section.
#[derive(Default)]
struct PassState {
    // candidate of the smallest view id per key
    intrinsics: BTreeMap<IntrinsicId, (ViewId, Intrinsic)>,
    ledger: DiagnosticsLedger,
}

/// Resolve and group the intrinsics of every view of a dataset.
///
/// Views are processed in parallel. Each worker resolves its view from
/// read-only inputs, then commits the result under a single lock: new
/// intrinsics are inserted if their key is absent, diagnostics and counters
/// are updated. When views with different parameters meet on one key, the
/// candidate of the smallest view id is kept. The final intrinsics and counts
/// do not depend on scheduling; only the example image kept per unknown
/// sensor may vary.
///
/// # Arguments
///
/// * `sfm_data` - The dataset, its views get their intrinsic reference assigned.
/// * `sensor_db` - The sensor width table.
/// * `config` - The run configuration.
///
/// # Returns
///
/// The report with diagnostics and the acceptance decision. Errors are only
/// returned for an invalid configuration or an empty dataset.
pub fn run(
    sfm_data: &mut SfmData,
    sensor_db: &SensorDatabase,
    config: &CameraInitConfig,
) -> Result<CameraInitReport, CameraInitError> {
    config.validate()?;
    if sfm_data.views.is_empty() {
        return Err(CameraInitError::NoViews);
    }

    let state = Mutex::new(PassState::default());
    let existing = &sfm_data.intrinsics;

    sfm_data.views.par_iter_mut().for_each(|(view_id, view)| {
        // compute
        let outcome = resolve_view(view, existing, sensor_db, config);

        let (assignment, complete) = match outcome.resolution {
            Resolution::AlreadyResolved => (None, true),
            Resolution::ExistingUnresolved | Resolution::UnknownSensor => (None, false),
            Resolution::NoMetadata => {
                view.intrinsic_id = None;
                (None, false)
            }
            Resolution::Resolved { intrinsic, source } => {
                log::debug!("view {}: focal length from {:?}", view_id, source);
                let complete = intrinsic.is_initialized();
                let (key, intrinsic) = group_key(view, intrinsic, config.grouping);
                view.intrinsic_id = Some(key);
                (Some((key, intrinsic)), complete)
            }
        };

        // commit
        let mut state = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((key, intrinsic)) = assignment {
            match state.intrinsics.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert((*view_id, intrinsic));
                }
                Entry::Occupied(mut slot) => {
                    let (owner, stored) = slot.get();
                    if *stored != intrinsic {
                        log::debug!(
                            "intrinsic {} shared by views {} and {} with different parameters",
                            key,
                            owner,
                            view_id
                        );
                    }
                    if *view_id < *owner {
                        slot.insert((*view_id, intrinsic));
                    }
                }
            }
        }
        if let Some(diagnostic) = &outcome.diagnostic {
            state.ledger.record(*view_id, &view.image_path, diagnostic);
        }
        if complete {
            state.ledger.complete_views += 1;
        }
    });

    let PassState { intrinsics, ledger } = match state.into_inner() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    };

    for (key, (_, intrinsic)) in intrinsics {
        sfm_data.intrinsics.entry(key).or_insert(intrinsic);
    }

    let acceptance = evaluate_acceptance(&ledger, config);
    log::debug!(
        "resolution pass done: {} complete view(s) out of {}",
        ledger.complete_views,
        sfm_data.views.len()
    );

    Ok(CameraInitReport {
        diagnostics: ledger,
        num_views: sfm_data.views.len(),
        num_intrinsics: sfm_data.intrinsics.len(),
        acceptance,
    })
}

/// Decide whether a completed pass is usable.
pub fn evaluate_acceptance(ledger: &DiagnosticsLedger, config: &CameraInitConfig) -> Acceptance {
    if config.allow_incomplete_output {
        return Acceptance::Accepted;
    }

    if ledger.has_unknown_sensors() {
        return Acceptance::Rejected(RejectReason::UnknownSensors(ledger.unknown_sensors.len()));
    }

    let required = if config.allow_single_view { 1 } else { 2 };
    if ledger.complete_views < required {
        return Acceptance::Rejected(RejectReason::NotEnoughViews {
            complete: ledger.complete_views,
            required,
        });
    }

    Acceptance::Accepted
}
