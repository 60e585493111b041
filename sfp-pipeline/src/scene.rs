use crate::Result;
use serde::{Deserialize, Serialize};
use sfp_core::{
    nalgebra::Point3, CameraToCamera, DescriberType, IntrinsicId, KeyPoint, Pair, PoseId, ViewId,
    WorldPoint, WorldToCamera,
};
use sfp_geom::Frustum;
use sfp_pinhole::CameraIntrinsicsK1Distortion;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// One input image together with references to its calibration and placement.
///
/// Views are immutable inputs. A view missing either reference (or whose
/// reference does not resolve) is carried through the scene but excluded from
/// every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    /// Path of the source image, relative to wherever the scene was built.
    pub image_path: PathBuf,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// The intrinsics of the camera that captured this view, shared by
    /// possibly many views.
    pub intrinsic: Option<IntrinsicId>,
    /// The placement of the camera at capture time, shared in rig setups.
    pub pose: Option<PoseId>,
}

/// One 2d sighting of a landmark in one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The pixel position of the detected feature.
    pub key_point: KeyPoint,
    /// The index of the region within the view's regions for the describer
    /// channel of the landmark.
    pub feature: usize,
}

/// A triangulated 3d point and the observations that support it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    /// The homogeneous world position.
    pub point: WorldPoint,
    /// The describer channel whose correspondences produced this landmark.
    pub describer: DescriberType,
    /// The observing views. Always at least two, at most one per view.
    pub observations: BTreeMap<ViewId, Observation>,
}

/// A scene dataset: posed and calibrated views plus the landmark structure
/// recovered for them.
///
/// Views, intrinsics, and poses are read-only inputs to the pipeline; only
/// the landmark container is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub views: BTreeMap<ViewId, View>,
    pub intrinsics: BTreeMap<IntrinsicId, CameraIntrinsicsK1Distortion>,
    pub poses: BTreeMap<PoseId, WorldToCamera>,
    pub landmarks: Vec<Landmark>,
}

impl Scene {
    /// Reads a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Writes the scene to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// True if the view exists and both its intrinsic and pose references
    /// resolve.
    pub fn is_valid_view(&self, view: ViewId) -> bool {
        self.views.get(&view).map_or(false, |v| {
            v.intrinsic.map_or(false, |ix| self.intrinsics.contains_key(&ix))
                && v.pose.map_or(false, |ix| self.poses.contains_key(&ix))
        })
    }

    /// The views that can participate in the pipeline, in ascending id order.
    pub fn valid_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views
            .keys()
            .copied()
            .filter(move |&view| self.is_valid_view(view))
    }

    /// The world-to-camera pose of a view, if its pose reference resolves.
    pub fn pose_of(&self, view: ViewId) -> Option<WorldToCamera> {
        self.poses.get(&self.views.get(&view)?.pose?).copied()
    }

    /// The intrinsics of a view, if its intrinsic reference resolves.
    pub fn intrinsics_of(&self, view: ViewId) -> Option<&CameraIntrinsicsK1Distortion> {
        self.intrinsics.get(&self.views.get(&view)?.intrinsic?)
    }

    /// The optical center of a view in world coordinates.
    pub fn camera_center(&self, view: ViewId) -> Option<Point3<f64>> {
        self.pose_of(view).map(WorldToCamera::center)
    }

    /// The relative pose transforming camera points of the lower view of the
    /// pair into camera points of the higher view.
    pub fn relative_pose(&self, pair: Pair) -> Option<CameraToCamera> {
        Some(CameraToCamera::from_poses(
            self.pose_of(pair.a())?,
            self.pose_of(pair.b())?,
        ))
    }

    /// The world-space viewing frustum of a view between the given depth
    /// bounds. [`None`] for invalid views and degenerate intrinsics.
    pub fn view_frustum(&self, view: ViewId, near: f64, far: f64) -> Option<Frustum> {
        let v = self.views.get(&view)?;
        Frustum::new(
            self.intrinsics_of(view)?,
            f64::from(v.width),
            f64::from(v.height),
            near,
            far,
            self.pose_of(view)?,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sfp_core::nalgebra::{Point2, Rotation3, Vector3};
    use sfp_core::Pose;
    use sfp_pinhole::CameraIntrinsics;

    fn scene() -> Scene {
        let mut scene = Scene::default();
        scene.intrinsics.insert(
            IntrinsicId(0),
            CameraIntrinsicsK1Distortion::new(
                CameraIntrinsics::identity()
                    .focal(600.0)
                    .principal_point(Point2::new(320.0, 240.0)),
                0.0,
            ),
        );
        scene.poses.insert(
            PoseId(0),
            WorldToCamera::from_parts(Vector3::new(0.1, 0.0, 0.0), Rotation3::identity()),
        );
        scene.views.insert(
            ViewId(0),
            View {
                image_path: "images/0.png".into(),
                width: 640,
                height: 480,
                intrinsic: Some(IntrinsicId(0)),
                pose: Some(PoseId(0)),
            },
        );
        scene.views.insert(
            ViewId(1),
            View {
                image_path: "images/1.png".into(),
                width: 640,
                height: 480,
                intrinsic: Some(IntrinsicId(0)),
                pose: Some(PoseId(7)),
            },
        );
        scene
    }

    #[test]
    fn dangling_pose_reference_invalidates_view() {
        let scene = scene();
        assert!(scene.is_valid_view(ViewId(0)));
        assert!(!scene.is_valid_view(ViewId(1)));
        assert_eq!(scene.valid_views().collect::<Vec<_>>(), vec![ViewId(0)]);
        assert!(scene.pose_of(ViewId(1)).is_none());
    }

    #[test]
    fn scene_roundtrips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut original = scene();
        original.landmarks.push(Landmark {
            point: sfp_core::Projective::from_point(Point3::new(1.0, 2.0, 3.0)),
            describer: DescriberType::Akaze,
            observations: BTreeMap::new(),
        });
        original.save(&path).unwrap();
        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded.views.len(), 2);
        assert_eq!(loaded.landmarks.len(), 1);
        assert_eq!(loaded.landmarks[0].describer, DescriberType::Akaze);
    }
}
