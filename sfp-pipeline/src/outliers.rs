use crate::Scene;
use log::info;
use sfp_core::Projective;
use sfp_geom::max_parallax_degrees;

/// Removes landmarks whose widest observation baseline subtends less than
/// `threshold_degrees` of parallax, along with landmarks that no longer have
/// two observations with usable poses. Returns how many were removed.
///
/// Landmarks observed at exactly the threshold angle stay, so running this
/// twice with the same threshold removes nothing the second time.
pub fn remove_outliers_by_angle(scene: &mut Scene, threshold_degrees: f64) -> usize {
    let before = scene.landmarks.len();
    let views = &scene.views;
    let poses = &scene.poses;
    scene.landmarks.retain(|landmark| {
        let euclidean = match landmark.point.point() {
            Some(euclidean) => euclidean,
            None => return false,
        };
        let centers: Vec<_> = landmark
            .observations
            .keys()
            .filter_map(|view| {
                let pose = views.get(view)?.pose.and_then(|pose| poses.get(&pose))?;
                Some(pose.center())
            })
            .collect();
        centers.len() >= 2
            && max_parallax_degrees(euclidean, centers.iter().copied()) >= threshold_degrees
    });
    let removed = before - scene.landmarks.len();
    info!(
        "removed {} of {} landmarks with parallax below {} degrees",
        removed, before, threshold_degrees
    );
    removed
}
