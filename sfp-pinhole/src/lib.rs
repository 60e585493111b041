//! This crate plugs into `sfp-core` and provides pinhole camera models with
//! and without distortion correction. A camera model converts pixel
//! coordinates into normalized image coordinates on the virtual image plane,
//! which is the representation every geometric stage of the pipeline operates
//! on, and converts them back with the `uncalibrate` method of the
//! [`sfp_core::CameraModel`] trait.

#![no_std]

use nalgebra::{Matrix3, Point2, Point3, Unit, UnitVector3, Vector2, Vector3};
use num_traits::Float;
use sfp_core::{CameraModel, CameraPoint, ImagePoint, KeyPoint, Projective};

use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point in normalized image coordinates. This keypoint has been corrected
/// for distortion and normalized based on the camera intrinsic matrix.
/// Note that the intrinsic matrix accounts for the natural focal length and
/// any magnification to the image, so a normalized keypoint is the position
/// on the virtual image plane one unit in front of the optical center.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NormalizedKeyPoint(pub Point2<f64>);

impl NormalizedKeyPoint {
    /// Tries to convert the [`CameraPoint`] into a [`NormalizedKeyPoint`],
    /// but it may fail in extreme conditions (depth of zero), in which case
    /// `None` is returned.
    pub fn from_camera_point(point: CameraPoint) -> Option<Self> {
        Point2::from_homogeneous(point.bearing_unnormalized()).map(Self)
    }

    /// Conceptually appends a `1.0` component to the normalized keypoint to
    /// create a [`CameraPoint`] on the virtual image plane and then
    /// multiplies the point by `depth`. The `depth` must be the depth of the
    /// keypoint along the direction the camera is pointing from the camera's
    /// optical center.
    pub fn with_depth(self, depth: f64) -> CameraPoint {
        CameraPoint::from_point(Point3::from((self.coords * depth).push(depth)))
    }

    /// The bearing of the keypoint out of the camera, before normalization.
    pub fn bearing_unnormalized(self) -> Vector3<f64> {
        self.coords.push(1.0)
    }

    /// The unit bearing of the keypoint out of the camera.
    pub fn bearing(self) -> UnitVector3<f64> {
        Unit::new_normalize(self.bearing_unnormalized())
    }
}

/// This contains intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// For a high quality camera, this may be sufficient to normalize image
/// coordinates. Undistortion may also be necessary to normalize image
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
    pub skew: f64,
}

impl CameraIntrinsics {
    /// Creates camera intrinsics that would create an identity intrinsic
    /// matrix. This would imply that the pixel positions have an origin at
    /// `0,0`, the pixel distance unit is the focal length, pixels are square,
    /// and there is no skew.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            skew: 0.0,
            principal_point: Point2::new(0.0, 0.0),
        }
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    pub fn skew(self, skew: f64) -> Self {
        Self { skew, ..self }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  self.skew,      self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }
}

impl CameraModel for CameraIntrinsics {
    type Projection = NormalizedKeyPoint;

    /// Takes in a point from an image in pixel coordinates and
    /// converts it to a [`NormalizedKeyPoint`].
    ///
    /// ```
    /// use sfp_core::{KeyPoint, CameraModel};
    /// use sfp_pinhole::{NormalizedKeyPoint, CameraIntrinsics};
    /// use sfp_core::nalgebra::{Vector2, Point2};
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    ///     skew: 1.7,
    /// };
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let nkp = intrinsics.calibrate(kp);
    /// let calibration_matrix = intrinsics.matrix();
    /// let distance = (kp.to_homogeneous() - calibration_matrix * nkp.to_homogeneous()).norm();
    /// assert!(distance < 0.1);
    /// ```
    fn calibrate<P>(&self, point: P) -> NormalizedKeyPoint
    where
        P: ImagePoint,
    {
        let centered = point.image_point() - self.principal_point;
        let y = centered.y / self.focals.y;
        let x = (centered.x - self.skew * y) / self.focals.x;
        NormalizedKeyPoint(Point2::new(x, y))
    }

    /// Converts a [`NormalizedKeyPoint`] back into pixel coordinates.
    ///
    /// ```
    /// use sfp_core::{KeyPoint, CameraModel};
    /// use sfp_pinhole::{NormalizedKeyPoint, CameraIntrinsics};
    /// use sfp_core::nalgebra::{Vector2, Point2};
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    ///     skew: 1.7,
    /// };
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let nkp = intrinsics.calibrate(kp);
    /// let ukp = intrinsics.uncalibrate(nkp);
    /// assert!((kp.0 - ukp.0).norm() < 1e-6);
    /// ```
    fn uncalibrate(&self, projection: NormalizedKeyPoint) -> KeyPoint {
        let y = projection.y * self.focals.y;
        let x = projection.x * self.focals.x + self.skew * projection.y;
        let centered = Point2::new(x, y);
        KeyPoint(centered + self.principal_point.coords)
    }
}

/// This contains intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// This also performs undistortion by applying one radial distortion
/// coefficient (K1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsicsK1Distortion {
    pub simple_intrinsics: CameraIntrinsics,
    pub k1: f64,
}

impl CameraIntrinsicsK1Distortion {
    /// Creates the camera intrinsics using simple intrinsics with no
    /// distortion and a K1 distortion coefficient.
    pub fn new(simple_intrinsics: CameraIntrinsics, k1: f64) -> Self {
        Self {
            simple_intrinsics,
            k1,
        }
    }

    /// The `3x3` calibration matrix of the underlying simple intrinsics.
    pub fn matrix(&self) -> Matrix3<f64> {
        self.simple_intrinsics.matrix()
    }
}

impl CameraModel for CameraIntrinsicsK1Distortion {
    type Projection = NormalizedKeyPoint;

    /// Takes in a point from an image in pixel coordinates and
    /// converts it to a [`NormalizedKeyPoint`].
    ///
    /// ```
    /// use sfp_core::{KeyPoint, CameraModel};
    /// use sfp_pinhole::{NormalizedKeyPoint, CameraIntrinsics, CameraIntrinsicsK1Distortion};
    /// use sfp_core::nalgebra::{Vector2, Point2};
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    ///     skew: 1.7,
    /// };
    /// let k1 = -0.164624;
    /// let intrinsics = CameraIntrinsicsK1Distortion::new(
    ///     intrinsics,
    ///     k1,
    /// );
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let nkp = intrinsics.calibrate(kp);
    /// let simple_nkp = intrinsics.simple_intrinsics.calibrate(kp);
    /// let distance = (nkp.0.coords - (simple_nkp.0.coords / (1.0 + k1 * simple_nkp.0.coords.norm_squared()))).norm();
    /// assert!(distance < 0.1);
    /// ```
    fn calibrate<P>(&self, point: P) -> NormalizedKeyPoint
    where
        P: ImagePoint,
    {
        let NormalizedKeyPoint(distorted) = self.simple_intrinsics.calibrate(point);
        let r2 = distorted.coords.norm_squared();
        let undistorted = (distorted.coords / (1.0 + self.k1 * r2)).into();

        NormalizedKeyPoint(undistorted)
    }

    /// Converts a [`NormalizedKeyPoint`] back into pixel coordinates.
    ///
    /// ```
    /// use sfp_core::{KeyPoint, CameraModel};
    /// use sfp_pinhole::{NormalizedKeyPoint, CameraIntrinsics, CameraIntrinsicsK1Distortion};
    /// use sfp_core::nalgebra::{Vector2, Point2};
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    ///     skew: 1.7,
    /// };
    /// let intrinsics = CameraIntrinsicsK1Distortion::new(
    ///     intrinsics,
    ///     -0.164624,
    /// );
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let nkp = intrinsics.calibrate(kp);
    /// let ukp = intrinsics.uncalibrate(nkp);
    /// assert!((kp.0 - ukp.0).norm() < 1e-6, "{:?}", (kp.0 - ukp.0).norm());
    /// ```
    fn uncalibrate(&self, projection: NormalizedKeyPoint) -> KeyPoint {
        let NormalizedKeyPoint(undistorted) = projection;
        // The quadratic below degenerates without distortion.
        if self.k1 == 0.0 {
            return self.simple_intrinsics.uncalibrate(projection);
        }
        // This was not easy to compute, but you can set up a quadratic to
        // solve for r^2 with the undistorted keypoint. This is the result.
        let u2 = undistorted.coords.norm_squared();
        // This is actually r^2 * k1.
        let r2_mul_k1 = -(2.0 * self.k1 * u2 + Float::sqrt(1.0 - 4.0 * self.k1 * u2) - 1.0)
            / (2.0 * self.k1 * u2);
        self.simple_intrinsics.uncalibrate(NormalizedKeyPoint(
            (undistorted.coords * (1.0 + r2_mul_k1)).into(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uncalibrate_roundtrip_without_distortion() {
        let intrinsics = CameraIntrinsicsK1Distortion::new(
            CameraIntrinsics::identity()
                .focals(Vector2::new(800.0, 900.0))
                .principal_point(Point2::new(500.0, 600.0)),
            0.0,
        );
        let kp = KeyPoint(Point2::new(471.0, 322.0));
        let roundtrip = intrinsics.uncalibrate(intrinsics.calibrate(kp));
        assert!((kp.0 - roundtrip.0).norm() < 1e-9);
    }

    #[test]
    fn with_depth_projects_onto_virtual_image_plane() {
        let nkp = NormalizedKeyPoint(Point2::new(0.3, -0.2));
        let point = nkp.with_depth(4.0);
        let reprojected = NormalizedKeyPoint::from_camera_point(point).unwrap();
        assert!((nkp.0 - reprojected.0).norm() < 1e-12);
        assert!((point.point().unwrap().z - 4.0).abs() < 1e-12);
    }
}
