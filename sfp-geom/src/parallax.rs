use num_traits::Float;
use sfp_core::nalgebra::Point3;

/// The largest angle, in degrees, subtended at `point` by any pair of the
/// given camera optical centers.
///
/// This is the parallax available to triangulate the point. A small value
/// means the observation rays are nearly parallel and the recovered depth is
/// unreliable, which is the criterion both for refusing to keep a freshly
/// triangulated point and for rejecting landmarks afterwards.
///
/// Returns `0.0` when fewer than two centers are given. A center that
/// coincides with the point contributes no angle.
pub fn max_parallax_degrees(
    point: Point3<f64>,
    centers: impl Iterator<Item = Point3<f64>> + Clone,
) -> f64 {
    let mut max_angle: f64 = 0.0;
    for (ix, a) in centers.clone().enumerate() {
        let ray_a = (a - point).normalize();
        for b in centers.clone().skip(ix + 1) {
            let ray_b = (b - point).normalize();
            // A degenerate ray produces NaN here, and `max` discards NaN.
            let angle = Float::acos(ray_a.dot(&ray_b).clamp(-1.0, 1.0)).to_degrees();
            max_angle = max_angle.max(angle);
        }
    }
    max_angle
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn right_angle_parallax() {
        let centers = [Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let angle = max_parallax_degrees(Point3::origin(), centers.iter().copied());
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn reports_widest_pair() {
        let centers = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.1, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ];
        let angle = max_parallax_degrees(Point3::origin(), centers.iter().copied());
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn single_center_has_no_parallax() {
        let centers = [Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            max_parallax_degrees(Point3::origin(), centers.iter().copied()),
            0.0
        );
    }
}
