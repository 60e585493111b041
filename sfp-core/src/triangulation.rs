use crate::{WorldPoint, WorldToCamera};
use nalgebra::UnitVector3;

/// This trait is for algorithms which triangulate a point from two or more
/// observations. Each observation is a [`WorldToCamera`] pose and the bearing
/// of the feature in that camera's frame.
///
/// Triangulation returns `None` when the observations cannot produce a
/// finite point in front of every observing camera, such as when the
/// bearings are parallel or the linear system is degenerate. Callers treat
/// that outcome as "drop the track", never as an error.
pub trait TriangulatorObservations {
    fn triangulate_observations(
        &self,
        observations: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    ) -> Option<WorldPoint>;
}
