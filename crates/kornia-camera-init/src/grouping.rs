use crate::camera::{Intrinsic, IntrinsicId};
use crate::config::GroupingMode;
use crate::hash::random_id;
use crate::view::View;

/// Compute the group key of a newly resolved intrinsic.
///
/// Returns the key together with the intrinsic to store under it, which may
/// carry a synthetic serial number when the view has no camera metadata. A key
/// already present on the view always wins over the computed one.
///
/// # Arguments
///
/// * `view` - The view the intrinsic was built for.
/// * `intrinsic` - The freshly built intrinsic.
/// * `mode` - The grouping policy.
pub fn group_key(view: &View, intrinsic: Intrinsic, mode: GroupingMode) -> (IntrinsicId, Intrinsic) {
    let intrinsic = tag_intrinsic(view, intrinsic, mode);

    if let Some(id) = view.intrinsic_id {
        return (id, intrinsic);
    }

    let key = match mode {
        GroupingMode::PerView => random_id(),
        GroupingMode::MetadataOrPerView if !view.has_camera_metadata() && view.rig.is_none() => {
            random_id()
        }
        _ => intrinsic.identity_hash(),
    };

    (key, intrinsic)
}

// No-metadata views are keyed by the physical camera when it is known: one
// group per rig sub-pose, otherwise one group per folder in folder mode.
fn tag_intrinsic(view: &View, intrinsic: Intrinsic, mode: GroupingMode) -> Intrinsic {
    if mode == GroupingMode::PerView || view.has_camera_metadata() {
        return intrinsic;
    }

    if let Some(rig) = view.rig {
        return intrinsic.with_serial_number(format!(
            "no_metadata_rig_{}_{}",
            rig.rig_id, rig.sub_pose_id
        ));
    }

    if mode == GroupingMode::MetadataOrFolder {
        return intrinsic.with_serial_number(view.parent_folder().to_string_lossy());
    }

    intrinsic
}
