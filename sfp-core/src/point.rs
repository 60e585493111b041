use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point3, Unit, UnitVector3, Vector3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented for homogeneous projective 3d coordinates.
pub trait Projective: From<Vector4<f64>> + Clone + Copy {
    /// Retrieve the homogeneous vector.
    ///
    /// No constraints are put on this vector. It is not normalized, but it may
    /// be normalized if desired and it will still be equivalent to the
    /// original.
    fn homogeneous(self) -> Vector4<f64>;

    /// Create the projective coordinate from a homogeneous vector.
    fn from_homogeneous(homogeneous: Vector4<f64>) -> Self {
        homogeneous.into()
    }

    /// Retrieve the euclidean 3d point by normalizing the homogeneous
    /// coordinate.
    ///
    /// This may fail, as a homogeneous coordinate can exist at near-infinity
    /// (like a star in the sky), whereas a 3d euclidean point cannot.
    fn point(self) -> Option<Point3<f64>> {
        Point3::from_homogeneous(self.homogeneous())
    }

    /// Convert a euclidean 3d point into homogeneous coordinates.
    fn from_point(point: Point3<f64>) -> Self {
        point.to_homogeneous().into()
    }

    /// Retrieve the normalized bearing of the coordinate.
    fn bearing(self) -> UnitVector3<f64> {
        Unit::new_normalize(self.bearing_unnormalized())
    }

    /// Retrieve the unnormalized bearing of the coordinate.
    ///
    /// Use this when the bearing does not need to be normalized.
    /// Otherwise use [`Projective::bearing`].
    fn bearing_unnormalized(self) -> Vector3<f64> {
        self.homogeneous().xyz()
    }
}

/// A 3d point relative to a camera's optical center and orientation, where
/// the positive X axis is right, positive Y axis is down, and positive Z axis
/// is forwards from the optical center. A point a camera can see has a
/// positive Z component.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraPoint(pub Vector4<f64>);

impl Projective for CameraPoint {
    fn homogeneous(self) -> Vector4<f64> {
        self.into()
    }
}

/// A 3d point in world coordinates, the shared frame that all camera poses of
/// a scene are expressed against. Landmark positions are world points.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldPoint(pub Vector4<f64>);

impl Projective for WorldPoint {
    fn homogeneous(self) -> Vector4<f64> {
        self.into()
    }
}
