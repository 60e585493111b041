use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use num_traits::Float;
use sfp_core::{
    nalgebra::Matrix3, CameraModel, CameraToCamera, FeatureMatch, GeometricModel, KeyPoint, Pose,
};
use sfp_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion, NormalizedKeyPoint};

/// This stores an essential matrix `E`, which is satisfied by the epipolar
/// constraint:
///
/// ```text
/// transpose(x') * E * x = 0
/// ```
///
/// Where `x` and `x'` are homogeneous normalized image coordinates of the
/// same landmark in the first and second camera. A homogeneous normalized
/// image coordinate is obtained by appending `1.0` to a
/// [`NormalizedKeyPoint`].
///
/// Because the camera poses are known, the essential matrix of a pair is
/// produced directly from the relative pose rather than estimated from
/// correspondences.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
pub struct EssentialMatrix(pub Matrix3<f64>);

/// Generates an essential matrix corresponding to this relative camera pose.
///
/// If a point `a` is transformed using [`Pose::transform`] into a point `b`,
/// then the essential matrix returned by this method will give a residual of
/// approximately `0.0` when you call `essential.residual(&FeatureMatch(a, b))`.
impl From<CameraToCamera> for EssentialMatrix {
    fn from(pose: CameraToCamera) -> Self {
        Self(pose.0.translation.vector.cross_matrix() * *pose.0.rotation.matrix())
    }
}

impl EssentialMatrix {
    /// The absolute value of the epipolar constraint for a match in
    /// normalized image coordinates. Zero for a perfect correspondence.
    pub fn residual(&self, m: &FeatureMatch<NormalizedKeyPoint>) -> f64 {
        let Self(mat) = *self;
        let &FeatureMatch(a, b) = m;

        // The result is a 1x1 matrix which we must get element 0 from.
        Float::abs((b.to_homogeneous().transpose() * mat * a.to_homogeneous())[0])
    }
}

/// This stores a fundamental matrix `F`, the pixel-space counterpart of the
/// [`EssentialMatrix`]:
///
/// ```text
/// transpose(p') * F * p = 0
/// ```
///
/// Where `p` and `p'` are homogeneous pixel coordinates. It is produced from
/// the essential matrix of the pair and the two calibration matrices as
/// `inverse(transpose(K')) * E * inverse(K)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
pub struct FundamentalMatrix(pub Matrix3<f64>);

impl FundamentalMatrix {
    /// Computes the fundamental matrix of a pair from its essential matrix
    /// and the calibration matrices of the two cameras.
    ///
    /// Returns [`None`] if either calibration matrix is singular, which only
    /// happens for degenerate intrinsics with a zero focal length.
    pub fn from_essential(
        essential: EssentialMatrix,
        a: &CameraIntrinsics,
        b: &CameraIntrinsics,
    ) -> Option<Self> {
        let a_inv = a.matrix().try_inverse()?;
        let b_inv = b.matrix().try_inverse()?;
        Some(Self(b_inv.transpose() * essential.0 * a_inv))
    }

    /// The symmetric epipolar distance of a pixel-space match.
    ///
    /// This is the larger of the two distances from each keypoint to the
    /// epipolar line that the other keypoint induces in its image. The result
    /// is in pixels, and it is not a number when a keypoint coincides with an
    /// epipole, which correctly fails any `<=` threshold test.
    pub fn residual(&self, m: &FeatureMatch<KeyPoint>) -> f64 {
        let Self(mat) = *self;
        let &FeatureMatch(a, b) = m;
        let a = a.to_homogeneous();
        let b = b.to_homogeneous();
        let line_in_b = mat * a;
        let line_in_a = mat.transpose() * b;
        // The algebraic constraint is the same scalar evaluated either way.
        let algebraic = Float::abs(b.dot(&line_in_b));
        let distance_in_a = algebraic / line_in_a.xy().norm();
        let distance_in_b = algebraic / line_in_b.xy().norm();
        distance_in_a.max(distance_in_b)
    }
}

/// This stores the homography induced by the plane at infinity,
/// `K' * R * inverse(K)`.
///
/// It transfers pixels of the first image into the second image as if all
/// structure were infinitely far away, which makes it the appropriate
/// validation model for pure-rotation pairs, where the epipolar constraint
/// degenerates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
pub struct InfiniteHomography(pub Matrix3<f64>);

impl InfiniteHomography {
    /// Computes the infinite homography of a pair from its relative pose and
    /// the calibration matrices of the two cameras.
    ///
    /// Returns [`None`] if the first calibration matrix is singular.
    pub fn from_relative(
        relative: CameraToCamera,
        a: &CameraIntrinsics,
        b: &CameraIntrinsics,
    ) -> Option<Self> {
        let rotation = *relative.isometry().rotation.matrix();
        Some(Self(b.matrix() * rotation * a.matrix().try_inverse()?))
    }

    /// The distance in pixels between the second keypoint and the transfer of
    /// the first keypoint into the second image.
    pub fn residual(&self, m: &FeatureMatch<KeyPoint>) -> f64 {
        let Self(mat) = *self;
        let &FeatureMatch(a, b) = m;
        let transferred = mat * a.to_homogeneous();
        (transferred.xy() / transferred.z - b.coords).norm()
    }
}

/// The validation geometry of one image pair, derived from the known poses
/// and intrinsics under a chosen [`GeometricModel`].
///
/// Whichever model is chosen, [`PairGeometry::residual`] evaluates a
/// pixel-space residual, so one threshold works across models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairGeometry {
    Fundamental(FundamentalMatrix),
    Essential {
        essential: EssentialMatrix,
        a: CameraIntrinsicsK1Distortion,
        b: CameraIntrinsicsK1Distortion,
        /// Scales algebraic residuals on normalized coordinates back into
        /// approximate pixels.
        focal_scale: f64,
    },
    Homography(InfiniteHomography),
}

impl PairGeometry {
    /// Derives the validation geometry of a pair from the relative pose
    /// `a` to `b` and the intrinsics of the two cameras.
    ///
    /// Returns [`None`] for degenerate intrinsics whose calibration matrix
    /// cannot be inverted.
    pub fn from_relative(
        model: GeometricModel,
        relative: CameraToCamera,
        a: &CameraIntrinsicsK1Distortion,
        b: &CameraIntrinsicsK1Distortion,
    ) -> Option<Self> {
        let essential = EssentialMatrix::from(relative);
        Some(match model {
            GeometricModel::Fundamental => Self::Fundamental(FundamentalMatrix::from_essential(
                essential,
                &a.simple_intrinsics,
                &b.simple_intrinsics,
            )?),
            GeometricModel::Essential => Self::Essential {
                essential,
                a: *a,
                b: *b,
                focal_scale: mean_focal(&a.simple_intrinsics, &b.simple_intrinsics),
            },
            GeometricModel::Homography => Self::Homography(InfiniteHomography::from_relative(
                relative,
                &a.simple_intrinsics,
                &b.simple_intrinsics,
            )?),
        })
    }

    /// The residual of a pixel-space match under this geometry, in pixels.
    ///
    /// Non-finite residuals arise from degenerate configurations such as a
    /// keypoint sitting exactly on an epipole, and they fail any `<=`
    /// threshold comparison without special handling.
    pub fn residual(&self, m: &FeatureMatch<KeyPoint>) -> f64 {
        match *self {
            Self::Fundamental(fundamental) => fundamental.residual(m),
            Self::Essential {
                essential,
                a,
                b,
                focal_scale,
            } => {
                let &FeatureMatch(pa, pb) = m;
                essential.residual(&FeatureMatch(a.calibrate(pa), b.calibrate(pb))) * focal_scale
            }
            Self::Homography(homography) => homography.residual(m),
        }
    }
}

fn mean_focal(a: &CameraIntrinsics, b: &CameraIntrinsics) -> f64 {
    (a.focals.x + a.focals.y + b.focals.x + b.focals.y) / 4.0
}

#[cfg(test)]
mod test {
    use super::*;
    use sfp_core::{
        nalgebra::{Point2, Point3, Rotation3, Vector3},
        Projective, WorldPoint, WorldToCamera,
    };

    fn cameras() -> (WorldToCamera, WorldToCamera) {
        let a = WorldToCamera::from_parts(
            Vector3::new(0.0, 0.0, 2.0),
            Rotation3::from_euler_angles(0.0, 0.1, 0.0),
        );
        let b = WorldToCamera::from_parts(
            Vector3::new(-0.5, 0.1, 2.1),
            Rotation3::from_euler_angles(0.05, -0.1, 0.02),
        );
        (a, b)
    }

    fn intrinsics() -> CameraIntrinsicsK1Distortion {
        CameraIntrinsicsK1Distortion::new(
            CameraIntrinsics::identity()
                .focal(800.0)
                .principal_point(Point2::new(320.0, 240.0)),
            0.0,
        )
    }

    fn project(pose: WorldToCamera, world: WorldPoint) -> KeyPoint {
        let camera = pose.transform(world);
        let normalized = NormalizedKeyPoint::from_camera_point(camera).unwrap();
        intrinsics().uncalibrate(normalized)
    }

    #[test]
    fn perfect_correspondences_have_zero_residual() {
        let (a, b) = cameras();
        let relative = CameraToCamera::from_poses(a, b);
        let world = WorldPoint::from_point(Point3::new(0.3, -0.2, 1.5));
        let m = FeatureMatch(project(a, world), project(b, world));

        for model in [
            GeometricModel::Fundamental,
            GeometricModel::Essential,
            // The infinite homography is exact only for rotation-only pairs,
            // so it is checked separately below.
        ] {
            let geometry =
                PairGeometry::from_relative(model, relative, &intrinsics(), &intrinsics()).unwrap();
            assert!(
                geometry.residual(&m) < 1e-9,
                "{} residual too high",
                model
            );
        }
    }

    #[test]
    fn epipolar_models_reject_displaced_keypoints() {
        let (a, b) = cameras();
        let relative = CameraToCamera::from_poses(a, b);
        let world = WorldPoint::from_point(Point3::new(0.3, -0.2, 1.5));
        let good = project(b, world);
        // Displace the second keypoint off its epipolar line by 10 pixels.
        let line = FundamentalMatrix::from_essential(
            EssentialMatrix::from(relative),
            &intrinsics().simple_intrinsics,
            &intrinsics().simple_intrinsics,
        )
        .unwrap()
        .0 * project(a, world).to_homogeneous();
        let normal = line.xy().normalize();
        let bad = KeyPoint(Point2::from(good.coords + 10.0 * normal));
        let m = FeatureMatch(project(a, world), bad);

        // The symmetric epipolar distance is at least the true displacement.
        let fundamental = PairGeometry::from_relative(
            GeometricModel::Fundamental,
            relative,
            &intrinsics(),
            &intrinsics(),
        )
        .unwrap();
        let residual = fundamental.residual(&m);
        assert!(residual >= 10.0 - 1e-6, "residual {} too small", residual);

        // The scaled algebraic error has a different normalization, but it
        // must still clearly exceed a pixel for a 10 pixel displacement.
        let essential = PairGeometry::from_relative(
            GeometricModel::Essential,
            relative,
            &intrinsics(),
            &intrinsics(),
        )
        .unwrap();
        assert!(essential.residual(&m) > 1.0);
    }

    #[test]
    fn infinite_homography_is_exact_for_rotation_only_pairs() {
        let a = WorldToCamera::identity();
        let b = WorldToCamera::from_parts(
            Vector3::zeros(),
            Rotation3::from_euler_angles(0.0, 0.2, 0.0),
        );
        let relative = CameraToCamera::from_poses(a, b);
        let geometry = PairGeometry::from_relative(
            GeometricModel::Homography,
            relative,
            &intrinsics(),
            &intrinsics(),
        )
        .unwrap();

        let world = WorldPoint::from_point(Point3::new(0.4, 0.1, 3.0));
        let m = FeatureMatch(project(a, world), project(b, world));
        assert!(geometry.residual(&m) < 1e-9);
    }
}
