use log::*;
use sfp_core::{DescriberType, GeometricModel};
use sfp_pipeline::{
    export_ply, load_matches, remove_outliers_by_angle, FrustumPairSelector, PairSelector,
    PrecomputedPairSelector, RegionsPerView, Scene, StructureEstimator, StructureSettings,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "sfp",
    about = "Triangulates scene structure from cameras whose poses are already known"
)]
struct Opt {
    /// The scene file holding views, intrinsics, and poses.
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,
    /// The directory holding the extracted regions of each view.
    #[structopt(short, long, parse(from_os_str))]
    features: PathBuf,
    /// Where to write the scene with its triangulated landmarks.
    ///
    /// A `.ply` extension writes the point cloud alone; any other extension
    /// writes the scene as JSON with the point cloud next to it.
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,
    /// The describer channels to match, separated by commas.
    #[structopt(short, long, default_value = "akaze", use_delimiter = true)]
    describer_types: Vec<DescriberType>,
    /// A directory holding precomputed matches.
    ///
    /// When given, its pairs replace frustum intersection as the candidate
    /// pairs; the correspondences themselves are still searched again under
    /// the known poses.
    #[structopt(short, long, parse(from_os_str))]
    matches: Option<PathBuf>,
    /// The geometric model correspondences are verified against: f, e, or h.
    #[structopt(short, long, default_value = "f")]
    geometric_model: GeometricModel,
    /// Landmarks seen with less parallax than this angle in degrees are removed.
    #[structopt(long, default_value = "2.0")]
    outlier_angle: f64,
    /// The file where settings are specified.
    ///
    /// This is in the format of `sfp_pipeline::StructureSettings`.
    #[structopt(short, long, default_value = "sfp-settings.json")]
    settings: PathBuf,
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let settings = File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: StructureSettings = settings.unwrap_or_default();

    let mut scene = Scene::load(&opt.input).expect("failed to load input scene");
    info!(
        "loaded a scene of {} views, {} of them posed and calibrated",
        scene.views.len(),
        scene.valid_views().count()
    );
    let mut regions = RegionsPerView::load(&opt.features, &scene, &opt.describer_types)
        .expect("failed to load regions");

    let precomputed = opt.matches.as_ref().map(|directory| {
        load_matches(directory, opt.geometric_model).expect("failed to load precomputed matches")
    });
    let pairs = match &precomputed {
        Some(matches) => PrecomputedPairSelector { matches }.select_pairs(&scene),
        None => FrustumPairSelector {
            near: settings.frustum_near,
            far: settings.frustum_far,
        }
        .select_pairs(&scene),
    };

    // Any landmarks in the input are from a previous run; structure is
    // recomputed from scratch.
    scene.landmarks.clear();
    let start = Instant::now();
    StructureEstimator::new(opt.geometric_model, opt.describer_types, settings)
        .estimate_structure(&mut scene, &mut regions, &pairs);
    remove_outliers_by_angle(&mut scene, opt.outlier_angle);
    info!(
        "structure estimation took {:.3} seconds and kept {} landmarks",
        start.elapsed().as_secs_f64(),
        scene.landmarks.len()
    );

    let ply_only = opt
        .output
        .extension()
        .map_or(false, |extension| extension == "ply");
    if ply_only {
        let file = File::create(&opt.output).expect("failed to create output file");
        export_ply(BufWriter::new(file), &scene).expect("failed to export point cloud");
    } else {
        scene.save(&opt.output).expect("failed to save output scene");
        let ply_path = opt.output.with_extension("ply");
        let file = File::create(&ply_path).expect("failed to create point cloud file");
        export_ply(BufWriter::new(file), &scene).expect("failed to export point cloud");
        info!("wrote the point cloud to {}", ply_path.display());
    }
}
