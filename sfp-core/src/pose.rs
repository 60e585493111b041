use crate::{CameraPoint, Projective, WorldPoint};
use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix3x4, Matrix4, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by the rigid transformations between the
/// reference frames of a scene:
///
/// * [`WorldToCamera`] - transforms [`WorldPoint`] into [`CameraPoint`]
/// * [`CameraToWorld`] - transforms [`CameraPoint`] into [`WorldPoint`]
/// * [`CameraToCamera`] - transforms [`CameraPoint`] of one camera into [`CameraPoint`] of another
pub trait Pose: From<IsometryMatrix3<f64>> + Clone + Copy {
    type InputPoint: Projective;
    type OutputPoint: Projective;
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> IsometryMatrix3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }

    /// Retrieve the homogeneous matrix.
    fn homogeneous(self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// Retrieve the `3x4` projection matrix `[R | t]` of the pose.
    ///
    /// This is the matrix that multiplies a homogeneous input point to
    /// produce the euclidean output point, and it is the form that linear
    /// triangulation operates on.
    fn matrix(self) -> Matrix3x4<f64> {
        let isometry = self.isometry();
        let rotation = isometry.rotation.matrix();
        let translation = isometry.translation.vector;
        Matrix3x4::from_columns(&[
            rotation.column(0),
            rotation.column(1),
            rotation.column(2),
            translation.column(0),
        ])
    }

    /// Transform the given point to an output point.
    fn transform(self, input: Self::InputPoint) -> Self::OutputPoint {
        Projective::from_homogeneous(self.homogeneous() * input.homogeneous())
    }
}

/// The pose of the world relative to a camera. This maps [`WorldPoint`] into
/// [`CameraPoint`], changing an absolute position into a vector relative to
/// the camera. This is the form camera extrinsics are stored in within a
/// scene dataset.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldToCamera(pub IsometryMatrix3<f64>);

impl Pose for WorldToCamera {
    type InputPoint = WorldPoint;
    type OutputPoint = CameraPoint;
    type Inverse = CameraToWorld;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

impl WorldToCamera {
    /// The optical center of the camera in world coordinates.
    pub fn center(self) -> Point3<f64> {
        let inverse = self.isometry().inverse();
        Point3::from(inverse.translation.vector)
    }
}

/// The pose of a camera relative to the world. This transforms camera points
/// (with depth as `z`) into world coordinates. This also tells you where the
/// camera is located and oriented in the world.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToWorld(pub IsometryMatrix3<f64>);

impl Pose for CameraToWorld {
    type InputPoint = CameraPoint;
    type OutputPoint = WorldPoint;
    type Inverse = WorldToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

/// A relative pose that transforms the [`CameraPoint`] of one camera into the
/// corresponding [`CameraPoint`] of another camera.
///
/// Camera space for a given camera is defined as thus:
///
/// * Origin is the optical center
/// * Positive z axis is forwards
/// * Positive y axis is down
/// * Positive x axis is right
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToCamera(pub IsometryMatrix3<f64>);

impl Pose for CameraToCamera {
    type InputPoint = CameraPoint;
    type OutputPoint = CameraPoint;
    type Inverse = CameraToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

impl CameraToCamera {
    /// Derives the relative pose from camera `A` to camera `B` given the
    /// world pose of each camera. Points in camera `A` space are first lifted
    /// into the world and then dropped into camera `B` space.
    pub fn from_poses(a: WorldToCamera, b: WorldToCamera) -> Self {
        (b.isometry() * a.isometry().inverse()).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn relative_pose_matches_composed_transforms() {
        let a = WorldToCamera::from_parts(
            Vector3::new(0.1, -0.2, 0.3),
            Rotation3::from_euler_angles(0.1, 0.2, 0.3),
        );
        let b = WorldToCamera::from_parts(
            Vector3::new(-0.4, 0.5, 0.1),
            Rotation3::from_euler_angles(-0.2, 0.1, 0.05),
        );
        let relative = CameraToCamera::from_poses(a, b);

        let world = WorldPoint::from_point(Point3::new(1.0, 2.0, 5.0));
        let in_a = a.transform(world);
        let in_b = b.transform(world);
        let mapped = relative.transform(in_a);

        let expected = in_b.point().unwrap();
        let got = mapped.point().unwrap();
        assert!((expected - got).norm() < 1e-12);
    }

    #[test]
    fn center_is_fixed_point_of_pose() {
        let pose = WorldToCamera::from_parts(
            Vector3::new(2.0, -1.0, 0.5),
            Rotation3::from_euler_angles(0.3, -0.1, 0.2),
        );
        let center = pose.center();
        let camera = pose.transform(WorldPoint::from_point(center));
        // The optical center maps to the camera-frame origin.
        assert!(camera.bearing_unnormalized().norm() < 1e-12);
    }
}
