use float_ord::FloatOrd;
use sfp_core::{
    nalgebra::{Point2, Point3, Vector3},
    CameraModel, KeyPoint, Pose, Projective, WorldToCamera,
};
use sfp_pinhole::NormalizedKeyPoint;

/// An oriented half-space given by the plane `normal · x + offset = 0`.
/// Points with a non-negative signed value lie on the interior side.
#[derive(Clone, Copy, Debug)]
struct HalfSpace {
    normal: Vector3<f64>,
    offset: f64,
}

impl HalfSpace {
    /// Computes the half-space through three points, oriented so that
    /// `interior` lies inside of it.
    fn through(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, interior: Point3<f64>) -> Self {
        let mut normal = (b - a).cross(&(c - a));
        let mut offset = -normal.dot(&a.coords);
        if normal.dot(&interior.coords) + offset < 0.0 {
            normal = -normal;
            offset = -offset;
        }
        Self { normal, offset }
    }

    fn signed(&self, point: Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.offset
    }

    /// True if every point lies strictly outside the half-space.
    fn excludes_all(&self, points: &[Point3<f64>; 8]) -> bool {
        points.iter().all(|&point| self.signed(point) < 0.0)
    }
}

/// The truncated viewing volume of a posed camera, in world coordinates.
///
/// The frustum is bounded by the image borders projected out to a near and a
/// far depth along the optical axis. It is stored as its eight corners,
/// its six face half-spaces, and a bounding sphere used to cheaply discard
/// pairs of frusta that are nowhere near each other.
///
/// ```text
///        7 ─────────── 6
///       /│            /│
///      / │    far    / │
///     3 ───────── 2    │
///     │  4 ───────│── 5
///     │ /   near  │ /
///     │/          │/
///     0 ───────── 1
/// ```
///
/// Corners `0..4` lie on the near plane and corners `4..8` on the far plane,
/// each quad ordered counter-clockwise as seen from the camera.
#[derive(Clone, Debug)]
pub struct Frustum {
    corners: [Point3<f64>; 8],
    faces: [HalfSpace; 6],
    center: Point3<f64>,
    radius: f64,
}

impl Frustum {
    /// Computes the frustum of a camera with the given intrinsics, image
    /// dimensions in pixels, and pose.
    ///
    /// The image borders are unprojected at depth `near` and depth `far` to
    /// produce the eight corners. Returns [`None`] if the intrinsics map any
    /// image corner to a non-finite position, which only happens for
    /// degenerate calibrations.
    pub fn new<C>(
        camera: &C,
        width: f64,
        height: f64,
        near: f64,
        far: f64,
        pose: WorldToCamera,
    ) -> Option<Self>
    where
        C: CameraModel<Projection = NormalizedKeyPoint>,
    {
        let camera_to_world = pose.inverse();
        let border = [
            KeyPoint(Point2::new(0.0, 0.0)),
            KeyPoint(Point2::new(width, 0.0)),
            KeyPoint(Point2::new(width, height)),
            KeyPoint(Point2::new(0.0, height)),
        ];
        let mut corners = [Point3::origin(); 8];
        for (ix, &key_point) in border.iter().enumerate() {
            let calibrated = camera.calibrate(key_point);
            for (slot, depth) in [(ix, near), (ix + 4, far)] {
                let world = camera_to_world.transform(calibrated.with_depth(depth));
                corners[slot] = world.point().filter(|point| {
                    point.coords.iter().all(|component| component.is_finite())
                })?;
            }
        }
        Some(Self::from_corners(corners))
    }

    fn from_corners(corners: [Point3<f64>; 8]) -> Self {
        let centroid = Point3::from(
            corners
                .iter()
                .map(|corner| corner.coords)
                .sum::<Vector3<f64>>()
                / 8.0,
        );
        let radius = corners
            .iter()
            .map(|corner| FloatOrd((corner - centroid).norm()))
            .max()
            .map(|FloatOrd(radius)| radius)
            .unwrap_or(0.0);
        let faces = [
            // Near and far caps.
            HalfSpace::through(corners[0], corners[1], corners[2], centroid),
            HalfSpace::through(corners[4], corners[5], corners[6], centroid),
            // One side face per border edge. The far corners lie on the rays
            // through the near corners, so three points suffice.
            HalfSpace::through(corners[0], corners[1], corners[4], centroid),
            HalfSpace::through(corners[1], corners[2], corners[5], centroid),
            HalfSpace::through(corners[2], corners[3], corners[6], centroid),
            HalfSpace::through(corners[3], corners[0], corners[7], centroid),
        ];
        Self {
            corners,
            faces,
            center: centroid,
            radius,
        }
    }

    /// The world-space corners of the frustum, near quad first.
    pub fn corners(&self) -> &[Point3<f64>; 8] {
        &self.corners
    }

    /// The center and radius of the bounding sphere of the frustum.
    pub fn bounding_sphere(&self) -> (Point3<f64>, f64) {
        (self.center, self.radius)
    }

    /// A conservative test of whether two frusta overlap.
    ///
    /// The bounding spheres are compared first so that far-apart frusta are
    /// rejected with a single distance computation. Otherwise each face plane
    /// of either frustum is tried as a separating plane against the corners of
    /// the other. The test never misses an intersection; it may report an
    /// intersection for a disjoint pair whose separating plane is not among
    /// the twelve faces.
    pub fn intersects(&self, other: &Self) -> bool {
        if (self.center - other.center).norm() > self.radius + other.radius {
            return false;
        }
        !self.separates(&other.corners) && !other.separates(&self.corners)
    }

    fn separates(&self, corners: &[Point3<f64>; 8]) -> bool {
        self.faces.iter().any(|face| face.excludes_all(corners))
    }

    /// True if the world point lies inside or on the boundary of the frustum.
    pub fn contains(&self, point: Point3<f64>) -> bool {
        self.faces.iter().all(|face| face.signed(point) >= 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sfp_core::nalgebra::{Rotation3, Vector3};
    use sfp_pinhole::CameraIntrinsics;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::identity()
            .focal(500.0)
            .principal_point(Point2::new(320.0, 240.0))
    }

    fn frustum(pose: WorldToCamera) -> Frustum {
        Frustum::new(&intrinsics(), 640.0, 480.0, 0.1, 10.0, pose).unwrap()
    }

    #[test]
    fn contains_point_on_optical_axis() {
        let frustum = frustum(WorldToCamera::identity());
        assert!(frustum.contains(Point3::new(0.0, 0.0, 5.0)));
        assert!(!frustum.contains(Point3::new(0.0, 0.0, -5.0)));
        assert!(!frustum.contains(Point3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn facing_cameras_intersect() {
        let a = frustum(WorldToCamera::identity());
        // Looking back at the origin from down the z axis.
        let b = frustum(WorldToCamera::from_parts(
            Vector3::new(0.0, 0.0, 5.0),
            Rotation3::from_euler_angles(0.0, core::f64::consts::PI, 0.0),
        ));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn back_to_back_cameras_do_not_intersect() {
        let a = frustum(WorldToCamera::identity());
        // Same optical center, looking the opposite way.
        let b = frustum(WorldToCamera::from_parts(
            Vector3::zeros(),
            Rotation3::from_euler_angles(0.0, core::f64::consts::PI, 0.0),
        ));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn distant_cameras_fail_the_sphere_test() {
        let a = frustum(WorldToCamera::identity());
        let b = frustum(WorldToCamera::from_parts(
            Vector3::new(1000.0, 0.0, 0.0),
            Rotation3::identity(),
        ));
        assert!(!a.intersects(&b));
    }
}
