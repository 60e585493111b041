use float_ord::FloatOrd;
use sfp_core::{
    nalgebra::{zero, Matrix4, UnitVector3},
    Pose, Projective, TriangulatorObservations, WorldPoint, WorldToCamera,
};

/// Triangulates a point from any number of posed observations with the
/// Linear-Eigen method described by Hartley and Sturm in the paper
/// ["Triangulation"](https://users.cecs.anu.edu.au/~hartley/Papers/triangulation/triangulation.pdf).
///
/// Each observation contributes the constraint that the point, projected by
/// the pose, lies along the observed bearing. Stacking the constraints of all
/// observations produces a 4x4 symmetric system whose eigenvector of smallest
/// eigenvalue is the homogeneous least-squares solution. Because the system is
/// accumulated one observation at a time, tracks of any length triangulate in
/// constant memory.
///
/// The solution is discarded if any component is not finite or if the point
/// does not lie in front of every observing camera.
///
/// ```
/// use sfp_core::nalgebra::{Point3, Rotation3, Vector3};
/// use sfp_core::{Pose, Projective, TriangulatorObservations, WorldPoint, WorldToCamera};
/// use sfp_geom::DltTriangulator;
///
/// let point = WorldPoint::from_point(Point3::new(0.3, 0.1, 2.0));
/// let poses = [
///     WorldToCamera::identity(),
///     WorldToCamera::from_parts(
///         Vector3::new(0.2, -0.1, 0.1),
///         Rotation3::from_euler_angles(0.05, 0.1, 0.0),
///     ),
///     WorldToCamera::from_parts(
///         Vector3::new(-0.3, 0.1, 0.05),
///         Rotation3::from_euler_angles(-0.1, 0.05, 0.02),
///     ),
/// ];
/// let observations = poses.iter().map(|&pose| (pose, pose.transform(point).bearing()));
/// let triangulated = DltTriangulator::new()
///     .triangulate_observations(observations)
///     .unwrap();
/// let distance = (point.point().unwrap() - triangulated.point().unwrap()).norm();
/// assert!(distance < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct DltTriangulator {
    epsilon: f64,
    max_iterations: usize,
}

impl DltTriangulator {
    /// Creates a `DltTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon used in the symmetric eigen solver.
    ///
    /// Default is `1e-12`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the maximum number of iterations for the symmetric eigen solver.
    ///
    /// Default is `1000`.
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

impl Default for DltTriangulator {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 1000,
        }
    }
}

impl TriangulatorObservations for DltTriangulator {
    fn triangulate_observations(
        &self,
        mut observations: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    ) -> Option<WorldPoint> {
        if observations.clone().count() < 2 {
            return None;
        }

        let mut a: Matrix4<f64> = zero();
        for (pose, bearing) in observations.clone() {
            let bearing = bearing.into_inner();
            let pose = pose.matrix();
            // Set up the least squares problem.
            let term = pose - bearing * bearing.transpose() * pose;
            a += term.transpose() * term;
        }

        let se = a.try_symmetric_eigen(self.epsilon, self.max_iterations)?;

        // The point lies in the null space, the eigenvector of the smallest
        // eigenvalue.
        se.eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| FloatOrd(n))
            .map(|(ix, _)| se.eigenvectors.column(ix).into_owned())
            .map(WorldPoint::from_homogeneous)
            .filter(|point| {
                // Ensure the point contains no NaN or infinity.
                point.homogeneous().iter().all(|n| n.is_finite())
            })
            .filter(|point| {
                // Ensure the cheirality constraint for every observation. The
                // homogeneous scale of the eigenvector is arbitrary, so the
                // depth sign must be taken relative to the sign of `w`.
                observations.all(|(pose, _)| {
                    let camera = pose.transform(*point);
                    camera.z * camera.w > 0.0
                })
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use sfp_core::nalgebra::{Point3, Rotation3, Vector3};

    fn poses() -> [WorldToCamera; 3] {
        [
            WorldToCamera::identity(),
            WorldToCamera::from_parts(
                Vector3::new(0.4, -0.1, 0.2),
                Rotation3::from_euler_angles(0.1, -0.2, 0.05),
            ),
            WorldToCamera::from_parts(
                Vector3::new(-0.5, 0.3, 0.1),
                Rotation3::from_euler_angles(-0.05, 0.15, -0.1),
            ),
        ]
    }

    #[test]
    fn recovers_noiseless_point() {
        let point = WorldPoint::from_point(Point3::new(0.2, -0.3, 3.0));
        let observations = poses().map(|pose| (pose, pose.transform(point).bearing()));
        let triangulated = DltTriangulator::new()
            .triangulate_observations(observations.iter().copied())
            .unwrap();
        assert_relative_eq!(
            point.point().unwrap(),
            triangulated.point().unwrap(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn rejects_single_observation() {
        let point = WorldPoint::from_point(Point3::new(0.2, -0.3, 3.0));
        let pose = WorldToCamera::identity();
        let observations = [(pose, pose.transform(point).bearing())];
        assert!(DltTriangulator::new()
            .triangulate_observations(observations.iter().copied())
            .is_none());
    }

    #[test]
    fn rejects_point_behind_a_camera() {
        // The point sits between the two cameras, behind the second one.
        let a = WorldToCamera::identity();
        let b = WorldToCamera::from_parts(Vector3::new(0.0, 0.0, -5.0), Rotation3::identity());
        let point = WorldPoint::from_point(Point3::new(0.0, 0.1, 2.0));
        let observations = [
            (a, a.transform(point).bearing()),
            (b, b.transform(point).bearing()),
        ];
        assert!(DltTriangulator::new()
            .triangulate_observations(observations.iter().copied())
            .is_none());
    }
}
