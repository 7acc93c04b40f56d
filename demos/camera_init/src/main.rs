use argh::FromArgs;
use std::path::PathBuf;

use kornia_camera_init::{
    list_images, read_sensor_database, run, views_from_images, CameraInitConfig, GroupingMode,
    IntrinsicDefaults, SensorDatabase, SfmData, DEFAULT_IMAGE_EXTENSIONS,
};

#[derive(FromArgs)]
/// Create the description of an input image dataset with initialized camera intrinsics
struct Args {
    /// a dataset file (*.json) to complete
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// input images folder
    #[argh(option)]
    image_folder: Option<PathBuf>,

    /// camera sensor width database path
    #[argh(option, short = 's')]
    sensor_database: Option<PathBuf>,

    /// output file path for the new dataset file
    #[argh(option, short = 'o', default = "PathBuf::from(\"cameraInit.json\")")]
    output: PathBuf,

    /// focal length in pixels
    #[argh(option)]
    default_focal_length_pix: Option<f64>,

    /// empirical value for the field of view in degrees
    #[argh(option)]
    default_field_of_view: Option<f64>,

    /// intrinsics K matrix "f;0;ppx;0;f;ppy;0;0;1"
    #[argh(option)]
    default_intrinsic: Option<String>,

    /// camera model type (pinhole, radial1, radial3, brown, fisheye4, fisheye1)
    #[argh(option)]
    default_camera_model: Option<String>,

    /// grouping mode. 0: one intrinsic per view, 1: group by metadata or one per view, 2: group by metadata or by folder
    #[argh(option, default = "2")]
    group_camera_model: u8,

    /// allow an output where some views have no initialized intrinsic
    #[argh(switch)]
    allow_incomplete_output: bool,

    /// allow an output with a single initialized view
    #[argh(switch)]
    allow_single_view: bool,

    /// number of threads to use
    #[argh(option, short = 'n')]
    num_threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    if let Some(num_threads) = args.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }

    let config = CameraInitConfig {
        grouping: GroupingMode::try_from(args.group_camera_model)?,
        allow_incomplete_output: args.allow_incomplete_output,
        allow_single_view: args.allow_single_view,
        defaults: IntrinsicDefaults::from_options(
            args.default_focal_length_pix,
            args.default_field_of_view,
            args.default_intrinsic.as_deref(),
            args.default_camera_model.as_deref(),
        )?,
    };

    let sensor_db = match &args.sensor_database {
        Some(path) => read_sensor_database(path)?,
        None => SensorDatabase::default(),
    };

    // load known information, or discover the images
    let mut sfm_data = match (&args.input, &args.image_folder) {
        (Some(input), None) => SfmData::load_json(input)?,
        (None, Some(folder)) => {
            let images = list_images(folder, DEFAULT_IMAGE_EXTENSIONS)?;
            log::info!("Found {} image(s) in {}", images.len(), folder.display());
            SfmData::from_views(views_from_images(&images)?)
        }
        (Some(_), Some(_)) => return Err("cannot combine --input and --image-folder".into()),
        (None, None) => return Err("--input or --image-folder is required".into()),
    };

    let report = run(&mut sfm_data, &sensor_db, &config)?;
    report.diagnostics.log_report();

    if let Err(e) = report.ensure_accepted() {
        log::error!(
            "Check your input images metadata (brand, model, focal length, ...), more should be set and correct."
        );
        return Err(e.into());
    }

    sfm_data.save_json(&args.output)?;
    report.log_summary();

    Ok(())
}
