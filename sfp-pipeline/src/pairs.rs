use crate::{PairwiseMatches, Scene};
use log::info;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use sfp_core::{Pair, ViewId};
use sfp_geom::Frustum;
use std::collections::BTreeSet;

/// Chooses the view pairs worth searching for correspondences.
pub trait PairSelector {
    fn select_pairs(&self, scene: &Scene) -> BTreeSet<Pair>;
}

/// Selects every pair of valid views whose viewing frustums intersect.
///
/// Views whose camera geometry cannot produce a frustum (a degenerate
/// intrinsic matrix, a non-finite pose) are left out rather than paired
/// with everything.
#[derive(Debug, Clone, Copy)]
pub struct FrustumPairSelector {
    pub near: f64,
    pub far: f64,
}

impl PairSelector for FrustumPairSelector {
    fn select_pairs(&self, scene: &Scene) -> BTreeSet<Pair> {
        let frustums: Vec<(ViewId, Frustum)> = scene
            .valid_views()
            .filter_map(|view| Some((view, scene.view_frustum(view, self.near, self.far)?)))
            .collect();
        let pairs: BTreeSet<Pair> = (0..frustums.len())
            .into_par_iter()
            .flat_map_iter(|ix| {
                let (view_a, frustum_a) = &frustums[ix];
                frustums[ix + 1..].iter().filter_map(move |(view_b, frustum_b)| {
                    frustum_a
                        .intersects(frustum_b)
                        .then(|| Pair::new(*view_a, *view_b))
                })
            })
            .collect();
        info!(
            "{} of {} view pairs have intersecting frustums",
            pairs.len(),
            frustums.len() * frustums.len().saturating_sub(1) / 2
        );
        pairs
    }
}

/// Selects the pairs that a precomputed match file already relates.
///
/// Only the pairing survives; the correspondences themselves are searched
/// again under the poses we now know.
#[derive(Debug, Clone, Copy)]
pub struct PrecomputedPairSelector<'a> {
    pub matches: &'a PairwiseMatches,
}

impl PairSelector for PrecomputedPairSelector<'_> {
    fn select_pairs(&self, scene: &Scene) -> BTreeSet<Pair> {
        let pairs: BTreeSet<Pair> = self
            .matches
            .iter()
            .filter(|(_, correspondences)| !correspondences.is_empty())
            .map(|(&pair, _)| pair)
            .filter(|pair| {
                pair.a() != pair.b()
                    && scene.is_valid_view(pair.a())
                    && scene.is_valid_view(pair.b())
            })
            .collect();
        info!(
            "{} of {} precomputed pairs relate valid views",
            pairs.len(),
            self.matches.len()
        );
        pairs
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::View;
    use sfp_core::nalgebra::{Point2, Rotation3, Vector2, Vector3};
    use sfp_core::{
        Correspondence, DescriberType, FeatureMatch, IntrinsicId, Pose, PoseId, WorldToCamera,
    };
    use sfp_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion};
    use std::f64::consts::PI;

    fn scene_with_poses(poses: &[WorldToCamera]) -> Scene {
        let mut scene = Scene::default();
        scene.intrinsics.insert(
            IntrinsicId(0),
            CameraIntrinsicsK1Distortion::new(
                CameraIntrinsics::identity()
                    .focals(Vector2::new(500.0, 500.0))
                    .principal_point(Point2::new(320.0, 240.0)),
                0.0,
            ),
        );
        for (ix, &pose) in poses.iter().enumerate() {
            let ix = ix as u32;
            scene.poses.insert(PoseId(ix), pose);
            scene.views.insert(
                ViewId(ix),
                View {
                    image_path: format!("{}.png", ix).into(),
                    width: 640,
                    height: 480,
                    intrinsic: Some(IntrinsicId(0)),
                    pose: Some(PoseId(ix)),
                },
            );
        }
        scene
    }

    #[test]
    fn frustum_selection_pairs_overlapping_views() {
        // Two cameras a small baseline apart looking down +z overlap, while a
        // third looks the opposite way from far off.
        let scene = scene_with_poses(&[
            WorldToCamera::identity(),
            WorldToCamera::from_parts(Vector3::new(0.5, 0.0, 0.0), Rotation3::identity()),
            WorldToCamera::from_parts(
                Vector3::new(0.0, 0.0, -5000.0),
                Rotation3::from_euler_angles(0.0, PI, 0.0),
            ),
        ]);
        let pairs = FrustumPairSelector {
            near: 0.1,
            far: 1000.0,
        }
        .select_pairs(&scene);
        assert_eq!(
            pairs.into_iter().collect::<Vec<_>>(),
            vec![Pair::new(ViewId(0), ViewId(1))]
        );
    }

    #[test]
    fn views_without_poses_are_never_paired() {
        let mut scene = scene_with_poses(&[WorldToCamera::identity(), WorldToCamera::identity()]);
        scene.views.get_mut(&ViewId(1)).unwrap().pose = None;
        let pairs = FrustumPairSelector {
            near: 0.1,
            far: 1000.0,
        }
        .select_pairs(&scene);
        assert!(pairs.is_empty());

        let mut matches = PairwiseMatches::new();
        matches.insert(
            Pair::new(ViewId(0), ViewId(1)),
            vec![Correspondence {
                describer: DescriberType::Akaze,
                indices: FeatureMatch(0, 0),
            }],
        );
        let pairs = PrecomputedPairSelector { matches: &matches }.select_pairs(&scene);
        assert!(pairs.is_empty());
    }

    #[test]
    fn precomputed_selection_drops_empty_pairs() {
        let scene = scene_with_poses(&[
            WorldToCamera::identity(),
            WorldToCamera::from_parts(Vector3::new(0.5, 0.0, 0.0), Rotation3::identity()),
        ]);
        let mut matches = PairwiseMatches::new();
        matches.insert(Pair::new(ViewId(0), ViewId(1)), vec![]);
        let pairs = PrecomputedPairSelector { matches: &matches }.select_pairs(&scene);
        assert!(pairs.is_empty());
    }
}
