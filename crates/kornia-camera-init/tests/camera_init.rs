//! End-to-end tests of the resolution pass over whole datasets.

use std::collections::BTreeSet;

use approx::assert_relative_eq;
use kornia_camera_init::{
    run, Acceptance, CameraInitConfig, CameraInitError, CameraModel, Datasheet, GroupingMode,
    Intrinsic, IntrinsicDefaults, RejectReason, SensorDatabase, SensorKey, SfmData, View,
};

fn acme_db() -> SensorDatabase {
    SensorDatabase::new([
        Datasheet::new("Acme", "X1", 23.5),
        Datasheet::new("Globex", "G7", 36.0),
    ])
}

fn acme(path: &str) -> View {
    View::new(path, 4000, 3000)
        .with_metadata("Make", "Acme")
        .with_metadata("Model", "X1")
        .with_metadata("FocalLength", "23.5")
}

fn bare(path: &str) -> View {
    View::new(path, 1920, 1080)
}

fn with_fov() -> CameraInitConfig {
    CameraInitConfig {
        defaults: IntrinsicDefaults {
            field_of_view_deg: Some(60.0),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn key_of(sfm_data: &SfmData, view: &View) -> u64 {
    sfm_data.views[&view.view_id]
        .intrinsic_id
        .expect("view should have an intrinsic")
}

#[test]
fn three_images_two_groups() -> Result<(), CameraInitError> {
    let a = acme("/data/shoot1/a.jpg");
    let b = acme("/data/shoot1/b.jpg");
    let c = bare("/data/shoot1/c.jpg");
    let mut sfm_data = SfmData::from_views([a.clone(), b.clone(), c.clone()]);

    let report = run(&mut sfm_data, &acme_db(), &with_fov())?;

    assert_eq!(key_of(&sfm_data, &a), key_of(&sfm_data, &b));
    assert_ne!(key_of(&sfm_data, &a), key_of(&sfm_data, &c));
    assert_eq!(sfm_data.intrinsics.len(), 2);
    assert_eq!(report.num_intrinsics, 2);
    assert_eq!(report.diagnostics.complete_views, 3);
    assert_eq!(report.acceptance, Acceptance::Accepted);

    // the no-metadata image is still reported
    assert_eq!(report.diagnostics.no_metadata.len(), 1);
    assert!(report.diagnostics.no_metadata.contains_key(&c.view_id));

    let shared = sfm_data.intrinsic_of(a.view_id).expect("intrinsic");
    assert_relative_eq!(shared.focal_length_pix.unwrap(), 4000.0);
    assert_eq!(shared.model, CameraModel::Pinhole);

    let folder = sfm_data.intrinsic_of(c.view_id).expect("intrinsic");
    assert_eq!(folder.serial_number.as_deref(), Some("/data/shoot1"));
    Ok(())
}

#[test]
fn per_view_mode_never_shares() -> Result<(), CameraInitError> {
    let views = (0..16)
        .map(|i| acme(&format!("/data/shoot1/{:02}.jpg", i)))
        .collect::<Vec<_>>();
    let mut sfm_data = SfmData::from_views(views);
    let config = CameraInitConfig {
        grouping: GroupingMode::PerView,
        ..Default::default()
    };

    let report = run(&mut sfm_data, &acme_db(), &config)?;

    let keys = sfm_data
        .views
        .values()
        .filter_map(|v| v.intrinsic_id)
        .collect::<BTreeSet<_>>();
    assert_eq!(keys.len(), 16);
    assert_eq!(sfm_data.intrinsics.len(), 16);
    assert!(report.is_accepted());
    Ok(())
}

#[test]
fn folder_mode_groups_by_folder() -> Result<(), CameraInitError> {
    let a = bare("/data/shoot1/a.jpg");
    let b = bare("/data/shoot1/b.jpg");
    let c = bare("/data/shoot2/c.jpg");
    let mut sfm_data = SfmData::from_views([a.clone(), b.clone(), c.clone()]);

    run(&mut sfm_data, &acme_db(), &with_fov())?;

    assert_eq!(key_of(&sfm_data, &a), key_of(&sfm_data, &b));
    assert_ne!(key_of(&sfm_data, &a), key_of(&sfm_data, &c));
    Ok(())
}

#[test]
fn metadata_or_per_view_without_metadata() -> Result<(), CameraInitError> {
    let a = bare("/data/shoot1/a.jpg");
    let b = bare("/data/shoot1/b.jpg");
    let mut sfm_data = SfmData::from_views([a.clone(), b.clone()]);
    let config = CameraInitConfig {
        grouping: GroupingMode::MetadataOrPerView,
        ..with_fov()
    };

    run(&mut sfm_data, &acme_db(), &config)?;

    assert_ne!(key_of(&sfm_data, &a), key_of(&sfm_data, &b));
    Ok(())
}

#[test]
fn metadata_or_per_view_groups_by_metadata() -> Result<(), CameraInitError> {
    let globex = |path: &str| {
        acme(path)
            .with_metadata("Make", "Globex")
            .with_metadata("Model", "G7")
    };
    let a = acme("/data/shoot1/a.jpg");
    let b = acme("/data/shoot2/b.jpg");
    let c = globex("/data/shoot1/c.jpg");
    let d = globex("/data/shoot2/d.jpg");
    let e = bare("/data/shoot1/e.jpg");
    let f = bare("/data/shoot1/f.jpg");
    let mut sfm_data =
        SfmData::from_views([a.clone(), b.clone(), c.clone(), d.clone(), e.clone(), f.clone()]);
    let config = CameraInitConfig {
        grouping: GroupingMode::MetadataOrPerView,
        ..with_fov()
    };

    let report = run(&mut sfm_data, &acme_db(), &config)?;

    // same camera across folders shares one intrinsic
    assert_eq!(key_of(&sfm_data, &a), key_of(&sfm_data, &b));
    assert_eq!(key_of(&sfm_data, &c), key_of(&sfm_data, &d));
    assert_ne!(key_of(&sfm_data, &a), key_of(&sfm_data, &c));
    // views without metadata stay alone
    assert_ne!(key_of(&sfm_data, &e), key_of(&sfm_data, &f));
    assert_eq!(sfm_data.intrinsics.len(), 4);
    assert_eq!(report.diagnostics.complete_views, 6);

    let globex_focal = sfm_data
        .intrinsic_of(c.view_id)
        .and_then(|i| i.focal_length_pix)
        .expect("focal length");
    assert_relative_eq!(globex_focal, 4000.0 * 23.5 / 36.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn rig_sub_poses_get_their_own_group() -> Result<(), CameraInitError> {
    let views = [
        bare("/rig/cam0/0001.jpg").with_rig(1, 0),
        bare("/rig/cam0/0002.jpg").with_rig(1, 0),
        bare("/rig/cam1/0001.jpg").with_rig(1, 1),
        bare("/rig/cam1/0002.jpg").with_rig(1, 1),
    ];
    let mut sfm_data = SfmData::from_views(views.clone());

    run(&mut sfm_data, &acme_db(), &with_fov())?;

    assert_eq!(key_of(&sfm_data, &views[0]), key_of(&sfm_data, &views[1]));
    assert_eq!(key_of(&sfm_data, &views[2]), key_of(&sfm_data, &views[3]));
    assert_ne!(key_of(&sfm_data, &views[0]), key_of(&sfm_data, &views[2]));
    Ok(())
}

#[test]
fn existing_intrinsics_are_kept() -> Result<(), CameraInitError> {
    let intrinsic = Intrinsic::new(CameraModel::Radial3, 4000, 3000, Some(3500.0), (2000.0, 1500.0));
    let a = acme("/data/shoot1/a.jpg").with_intrinsic_id(11);
    let b = acme("/data/shoot1/b.jpg").with_intrinsic_id(11);
    let mut sfm_data = SfmData::from_views([a.clone(), b.clone()]);
    sfm_data.intrinsics.insert(11, intrinsic.clone());

    let report = run(&mut sfm_data, &acme_db(), &CameraInitConfig::default())?;

    assert_eq!(sfm_data.intrinsics.len(), 1);
    assert_eq!(sfm_data.intrinsics[&11], intrinsic);
    assert_eq!(key_of(&sfm_data, &a), 11);
    assert_eq!(report.diagnostics.complete_views, 2);
    assert!(report.is_accepted());
    Ok(())
}

#[test]
fn dangling_reference_keeps_its_id() -> Result<(), CameraInitError> {
    let a = acme("/data/shoot1/a.jpg").with_intrinsic_id(5);
    let b = acme("/data/shoot1/b.jpg");
    let mut sfm_data = SfmData::from_views([a.clone(), b.clone()]);

    run(&mut sfm_data, &acme_db(), &CameraInitConfig::default())?;

    assert_eq!(key_of(&sfm_data, &a), 5);
    assert_ne!(key_of(&sfm_data, &b), 5);
    assert_eq!(sfm_data.intrinsics[&5], sfm_data.intrinsics[&key_of(&sfm_data, &b)]);
    Ok(())
}

#[test]
fn shared_dangling_id_keeps_smallest_view() -> Result<(), Box<dyn std::error::Error>> {
    let views = (0..256u32)
        .map(|i| {
            View::new(format!("/data/shoot1/{:03}.jpg", i), 1000 + i, 800)
                .with_metadata("Make", "Acme")
                .with_metadata("Model", "X1")
                .with_metadata("FocalLength", "23.5")
                .with_intrinsic_id(5)
        })
        .collect::<Vec<_>>();
    let first = views
        .iter()
        .min_by_key(|v| v.view_id)
        .map(|v| v.width)
        .expect("views");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build()?;
    for _ in 0..8 {
        let mut sfm_data = SfmData::from_views(views.clone());
        let report = pool.install(|| run(&mut sfm_data, &acme_db(), &CameraInitConfig::default()))?;

        assert!(sfm_data.views.values().all(|v| v.intrinsic_id == Some(5)));
        assert_eq!(sfm_data.intrinsics.len(), 1);
        assert_eq!(report.diagnostics.complete_views, 256);

        let stored = &sfm_data.intrinsics[&5];
        assert_eq!(stored.width, first);
        assert_relative_eq!(stored.focal_length_pix.unwrap(), first as f64);
    }
    Ok(())
}

#[test]
fn unknown_sensor_blocks_strict_runs() -> Result<(), CameraInitError> {
    let unknown = |path: &str| acme(path).with_metadata("Model", "X2");
    let views = [
        acme("/data/a.jpg"),
        acme("/data/b.jpg"),
        unknown("/data/c.jpg"),
        unknown("/data/d.jpg"),
    ];

    let mut strict = SfmData::from_views(views.clone());
    let report = run(&mut strict, &acme_db(), &CameraInitConfig::default())?;
    assert_eq!(
        report.acceptance,
        Acceptance::Rejected(RejectReason::UnknownSensors(1))
    );
    assert!(matches!(
        report.ensure_accepted(),
        Err(CameraInitError::AcceptanceFailure(_))
    ));
    let key = SensorKey::new("Acme", "X2");
    assert!(report.diagnostics.unknown_sensors.contains_key(&key));
    assert_eq!(strict.views[&views[2].view_id].intrinsic_id, None);
    assert_eq!(strict.intrinsics.len(), 1);

    // one of the two images is kept as example, which one depends on scheduling
    let example = &report.diagnostics.unknown_sensors[&key];
    assert!(example.ends_with("c.jpg") || example.ends_with("d.jpg"));

    let mut tolerant = SfmData::from_views(views.clone());
    let config = CameraInitConfig {
        allow_incomplete_output: true,
        ..Default::default()
    };
    let report = run(&mut tolerant, &acme_db(), &config)?;
    assert!(report.is_accepted());
    assert_eq!(report.diagnostics.unknown_sensors.len(), 1);
    assert_eq!(report.diagnostics.complete_views, 2);
    let unresolved = tolerant.intrinsic_of(views[2].view_id).expect("intrinsic");
    assert!(!unresolved.is_initialized());
    Ok(())
}

#[test]
fn no_metadata_tolerated_clears_intrinsic() -> Result<(), CameraInitError> {
    let a = bare("/data/a.jpg").with_intrinsic_id(77);
    let mut sfm_data = SfmData::from_views([a.clone(), acme("/data/b.jpg"), acme("/data/c.jpg")]);
    let config = CameraInitConfig {
        allow_incomplete_output: true,
        ..with_fov()
    };

    let report = run(&mut sfm_data, &acme_db(), &config)?;

    assert_eq!(sfm_data.views[&a.view_id].intrinsic_id, None);
    assert_eq!(report.diagnostics.no_metadata.len(), 1);
    assert_eq!(report.diagnostics.complete_views, 2);
    assert_eq!(sfm_data.intrinsics.len(), 1);
    Ok(())
}

#[test]
fn single_view_gate() -> Result<(), CameraInitError> {
    let view = acme("/data/a.jpg");

    let mut sfm_data = SfmData::from_views([view.clone()]);
    let report = run(&mut sfm_data, &acme_db(), &CameraInitConfig::default())?;
    assert_eq!(
        report.acceptance,
        Acceptance::Rejected(RejectReason::NotEnoughViews {
            complete: 1,
            required: 2
        })
    );

    let mut sfm_data = SfmData::from_views([view]);
    let config = CameraInitConfig {
        allow_single_view: true,
        ..Default::default()
    };
    let report = run(&mut sfm_data, &acme_db(), &config)?;
    assert!(report.is_accepted());
    Ok(())
}

#[test]
fn unresolved_views_do_not_count() -> Result<(), CameraInitError> {
    // no metadata, no defaults: intrinsics exist but stay unresolved
    let mut sfm_data = SfmData::from_views([bare("/data/a.jpg"), bare("/data/b.jpg")]);

    let report = run(&mut sfm_data, &acme_db(), &CameraInitConfig::default())?;

    assert_eq!(sfm_data.intrinsics.len(), 1);
    assert!(sfm_data.intrinsics.values().all(|i| !i.is_initialized()));
    assert_eq!(report.diagnostics.complete_views, 0);
    assert!(matches!(
        report.acceptance,
        Acceptance::Rejected(RejectReason::NotEnoughViews { complete: 0, .. })
    ));
    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> Result<(), CameraInitError> {
    let views = (0..64)
        .map(|i| match i % 4 {
            0 => acme(&format!("/data/shoot1/{}.jpg", i)),
            1 => bare(&format!("/data/shoot{}/{}.jpg", i % 3, i)),
            2 => bare(&format!("/rig/{}.jpg", i)).with_rig(2, (i % 3) as u32),
            _ => acme(&format!("/data/shoot2/{}.jpg", i)).with_metadata("Model", "X9"),
        })
        .collect::<Vec<_>>();
    let config = with_fov();

    let mut first = SfmData::from_views(views.clone());
    let first_report = run(&mut first, &acme_db(), &config)?;
    let mut second = SfmData::from_views(views);
    let second_report = run(&mut second, &acme_db(), &config)?;

    assert_eq!(first, second);
    assert_eq!(
        first_report.diagnostics.complete_views,
        second_report.diagnostics.complete_views
    );
    assert_eq!(
        first_report.diagnostics.no_metadata,
        second_report.diagnostics.no_metadata
    );
    assert_eq!(
        first_report
            .diagnostics
            .unknown_sensors
            .keys()
            .collect::<Vec<_>>(),
        second_report
            .diagnostics
            .unknown_sensors
            .keys()
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn configuration_conflict_is_fatal() {
    let mut sfm_data = SfmData::from_views([acme("/data/a.jpg"), acme("/data/b.jpg")]);
    let config = CameraInitConfig {
        defaults: IntrinsicDefaults {
            focal_length_pix: Some(1000.0),
            field_of_view_deg: Some(60.0),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        run(&mut sfm_data, &acme_db(), &config),
        Err(CameraInitError::ConfigurationConflict(..))
    ));
    assert!(sfm_data.views.values().all(|v| v.intrinsic_id.is_none()));
}

#[test]
fn empty_dataset_is_an_error() {
    let mut sfm_data = SfmData::default();
    assert!(matches!(
        run(&mut sfm_data, &acme_db(), &CameraInitConfig::default()),
        Err(CameraInitError::NoViews)
    ));
}
