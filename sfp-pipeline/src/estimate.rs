use crate::{
    build_tracks, Landmark, Observation, PairwiseMatches, RegionsPerView, Scene,
    StructureSettings, Track, ViewRegions,
};
use bitarray::{BitArray, Hamming};
use itertools::Itertools;
use log::info;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use sfp_core::{
    CameraModel, Correspondence, DescriberType, FeatureMatch, GeometricModel, Pair, Projective,
    TriangulatorObservations,
};
use sfp_geom::{
    max_parallax_degrees, DltTriangulator, EssentialMatrix, FundamentalMatrix, PairGeometry,
};
use space::{Knn, LinearKnn};
use std::collections::{BTreeMap, BTreeSet};

/// Estimates scene structure from views whose poses are already known.
///
/// The estimator never touches the poses or intrinsics; it only matches
/// regions between candidate pairs, verifies the matches against the pair's
/// epipolar geometry, fuses them into tracks, and triangulates each track
/// into a landmark.
#[derive(Debug, Clone)]
pub struct StructureEstimator {
    model: GeometricModel,
    describers: Vec<DescriberType>,
    settings: StructureSettings,
}

impl StructureEstimator {
    pub fn new(
        model: GeometricModel,
        describers: Vec<DescriberType>,
        settings: StructureSettings,
    ) -> Self {
        Self {
            model,
            describers,
            settings,
        }
    }

    /// Runs matching, geometric filtering, track building, and triangulation
    /// over the candidate pairs, appending the triangulated landmarks to the
    /// scene. Returns how many landmarks were added.
    pub fn estimate_structure(
        &self,
        scene: &mut Scene,
        regions: &mut RegionsPerView,
        pairs: &BTreeSet<Pair>,
    ) -> usize {
        let matches = self.match_pairs(scene, regions, pairs);
        // Descriptors are only consumed by matching; the remaining stages
        // work on keypoints alone.
        regions.clear_descriptors();
        let (tracks, conflicting) = self.filter_matches(scene, regions, &matches);
        if conflicting != 0 {
            info!("discarded {} conflicting tracks", conflicting);
        }
        self.triangulate(scene, regions, &tracks)
    }

    /// Searches each candidate pair for mutual descriptor matches consistent
    /// with the epipolar geometry the known poses imply.
    pub fn match_pairs(
        &self,
        scene: &Scene,
        regions: &RegionsPerView,
        pairs: &BTreeSet<Pair>,
    ) -> PairwiseMatches {
        let matches: PairwiseMatches = pairs
            .par_iter()
            .filter_map(|&pair| {
                let fundamental = self.pair_fundamental(scene, pair)?;
                let correspondences = self
                    .describers
                    .iter()
                    .flat_map(|&describer| {
                        let (a, b) = match (
                            regions.get(pair.a(), describer),
                            regions.get(pair.b(), describer),
                        ) {
                            (Some(a), Some(b)) => (a, b),
                            _ => return vec![],
                        };
                        self.guided_matching(&fundamental, a, b)
                            .into_iter()
                            .map(|indices| Correspondence { describer, indices })
                            .collect_vec()
                    })
                    .collect_vec();
                (!correspondences.is_empty()).then(|| (pair, correspondences))
            })
            .collect();
        info!(
            "matched {} correspondences across {} of {} candidate pairs",
            matches.values().map(Vec::len).sum::<usize>(),
            matches.len(),
            pairs.len()
        );
        matches
    }

    /// Re-verifies correspondences against the configured geometric model
    /// and fuses the survivors into tracks. Returns the tracks and the
    /// number of connected components discarded for view conflicts.
    pub fn filter_matches(
        &self,
        scene: &Scene,
        regions: &RegionsPerView,
        matches: &PairwiseMatches,
    ) -> (Vec<Track>, usize) {
        let verified: PairwiseMatches = matches
            .par_iter()
            .filter_map(|(&pair, correspondences)| {
                let geometry = self.pair_geometry(scene, pair)?;
                let survivors = correspondences
                    .iter()
                    .copied()
                    .filter(|correspondence| {
                        let m = match (
                            regions.key_point(
                                pair.a(),
                                correspondence.describer,
                                correspondence.indices.0,
                            ),
                            regions.key_point(
                                pair.b(),
                                correspondence.describer,
                                correspondence.indices.1,
                            ),
                        ) {
                            (Some(a), Some(b)) => FeatureMatch(a, b),
                            _ => return false,
                        };
                        geometry.residual(&m) <= self.settings.filter_max_epipolar_error
                    })
                    .collect_vec();
                (!survivors.is_empty()).then(|| (pair, survivors))
            })
            .collect();
        info!(
            "{} correspondences in {} pairs passed geometric filtering",
            verified.values().map(Vec::len).sum::<usize>(),
            verified.len()
        );
        build_tracks(&verified)
    }

    /// Triangulates each track from all of its observations, keeping points
    /// that land in front of every camera with enough parallax.
    pub fn triangulate(
        &self,
        scene: &mut Scene,
        regions: &RegionsPerView,
        tracks: &[Track],
    ) -> usize {
        let triangulator = DltTriangulator::new()
            .epsilon(self.settings.triangulation_epsilon)
            .max_iterations(self.settings.triangulation_max_iterations);
        let scene_ref: &Scene = scene;
        let landmarks: Vec<Landmark> = tracks
            .par_iter()
            .filter_map(|track| self.triangulate_track(scene_ref, regions, &triangulator, track))
            .collect();
        info!("triangulated {} of {} tracks", landmarks.len(), tracks.len());
        let added = landmarks.len();
        scene.landmarks.extend(landmarks);
        added
    }

    fn triangulate_track(
        &self,
        scene: &Scene,
        regions: &RegionsPerView,
        triangulator: &DltTriangulator,
        track: &Track,
    ) -> Option<Landmark> {
        let mut observations = BTreeMap::new();
        let mut pose_bearings = Vec::with_capacity(track.observations.len());
        let mut centers = Vec::with_capacity(track.observations.len());
        for (&view, &feature) in &track.observations {
            let pose = scene.pose_of(view)?;
            let intrinsics = scene.intrinsics_of(view)?;
            let key_point = regions.key_point(view, track.describer, feature)?;
            pose_bearings.push((pose, intrinsics.calibrate(key_point).bearing()));
            centers.push(pose.center());
            observations.insert(view, Observation { key_point, feature });
        }
        let point = triangulator.triangulate_observations(pose_bearings.iter().copied())?;
        let euclidean = point.point()?;
        if max_parallax_degrees(euclidean, centers.iter().copied())
            < self.settings.min_parallax_angle
        {
            return None;
        }
        Some(Landmark {
            point,
            describer: track.describer,
            observations,
        })
    }

    fn pair_fundamental(&self, scene: &Scene, pair: Pair) -> Option<FundamentalMatrix> {
        let relative = scene.relative_pose(pair)?;
        let a = scene.intrinsics_of(pair.a())?;
        let b = scene.intrinsics_of(pair.b())?;
        FundamentalMatrix::from_essential(
            EssentialMatrix::from(relative),
            &a.simple_intrinsics,
            &b.simple_intrinsics,
        )
    }

    fn pair_geometry(&self, scene: &Scene, pair: Pair) -> Option<PairGeometry> {
        let relative = scene.relative_pose(pair)?;
        let a = scene.intrinsics_of(pair.a())?;
        let b = scene.intrinsics_of(pair.b())?;
        PairGeometry::from_relative(self.model, relative, a, b)
    }

    /// Mutual k-nearest-neighbor matching between two region sets.
    ///
    /// A match must beat its runner-up by the configured Hamming margin in
    /// both directions and sit within `match_max_epipolar_error` pixels of
    /// its epipolar line.
    fn guided_matching(
        &self,
        fundamental: &FundamentalMatrix,
        a: &ViewRegions,
        b: &ViewRegions,
    ) -> Vec<FeatureMatch<usize>> {
        if a.descriptors.len() < 2 || b.descriptors.len() < 2 {
            return vec![];
        }
        let forward = self.matching(fundamental, a, b, false);
        let reverse = self.matching(fundamental, b, a, true);
        forward
            .iter()
            .enumerate()
            .filter_map(|(aix, &bix)| {
                let bix = bix?;
                (reverse[bix] == Some(aix)).then(|| FeatureMatch(aix, bix))
            })
            .collect()
    }

    fn matching(
        &self,
        fundamental: &FundamentalMatrix,
        query: &ViewRegions,
        target: &ViewRegions,
        reversed: bool,
    ) -> Vec<Option<usize>> {
        let knn = LinearKnn {
            metric: Hamming,
            iter: target.descriptors.iter(),
        };
        query
            .descriptors
            .iter()
            .enumerate()
            .map(|(qix, descriptor)| {
                let nearest = knn.knn(descriptor, 2);
                (nearest[0].distance + self.settings.match_better_by <= nearest[1].distance)
                    .then(|| nearest[0].index)
                    .filter(|&tix| {
                        let m = if reversed {
                            FeatureMatch(target.key_points[tix], query.key_points[qix])
                        } else {
                            FeatureMatch(query.key_points[qix], target.key_points[tix])
                        };
                        fundamental.residual(&m) <= self.settings.match_max_epipolar_error
                    })
            })
            .collect()
    }
}
