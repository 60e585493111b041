use serde::{Deserialize, Serialize};

/// The tunable parameters of the structure estimation pipeline.
///
/// Every field has a serde default, so a settings file only needs to name the
/// values it wants to override.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSettings {
    /// The near depth bound, in world units, of the viewing frustum derived
    /// for each posed view.
    #[serde(default = "default_frustum_near")]
    pub frustum_near: f64,
    /// The far depth bound, in world units, of the viewing frustum derived
    /// for each posed view.
    #[serde(default = "default_frustum_far")]
    pub frustum_far: f64,
    /// How much better (lower) the Hamming distance of the best descriptor
    /// match must be compared to the second best to accept the match.
    #[serde(default = "default_match_better_by")]
    pub match_better_by: u32,
    /// The maximum epipolar distance in pixels for a putative correspondence
    /// to survive pose-guided matching.
    #[serde(default = "default_match_max_epipolar_error")]
    pub match_max_epipolar_error: f64,
    /// The maximum residual in pixels under the configured geometric model
    /// for a correspondence to survive filtering.
    #[serde(default = "default_filter_max_epipolar_error")]
    pub filter_max_epipolar_error: f64,
    /// The minimum parallax angle in degrees for a triangulated track to be
    /// kept. Below this the depth is too poorly conditioned.
    #[serde(default = "default_min_parallax_angle")]
    pub min_parallax_angle: f64,
    /// The epsilon used by the triangulation eigen solver.
    #[serde(default = "default_triangulation_epsilon")]
    pub triangulation_epsilon: f64,
    /// The maximum number of iterations of the triangulation eigen solver.
    #[serde(default = "default_triangulation_max_iterations")]
    pub triangulation_max_iterations: usize,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            frustum_near: default_frustum_near(),
            frustum_far: default_frustum_far(),
            match_better_by: default_match_better_by(),
            match_max_epipolar_error: default_match_max_epipolar_error(),
            filter_max_epipolar_error: default_filter_max_epipolar_error(),
            min_parallax_angle: default_min_parallax_angle(),
            triangulation_epsilon: default_triangulation_epsilon(),
            triangulation_max_iterations: default_triangulation_max_iterations(),
        }
    }
}

fn default_frustum_near() -> f64 {
    0.1
}

fn default_frustum_far() -> f64 {
    1000.0
}

fn default_match_better_by() -> u32 {
    24
}

fn default_match_max_epipolar_error() -> f64 {
    4.0
}

fn default_filter_max_epipolar_error() -> f64 {
    4.0
}

fn default_min_parallax_angle() -> f64 {
    2.0
}

fn default_triangulation_epsilon() -> f64 {
    1e-12
}

fn default_triangulation_max_iterations() -> usize {
    1000
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_settings_files_fill_in_defaults() {
        let settings: StructureSettings =
            serde_json::from_str(r#"{ "min_parallax_angle": 5.0 }"#).unwrap();
        assert_eq!(settings.min_parallax_angle, 5.0);
        assert_eq!(settings.frustum_near, default_frustum_near());
        assert_eq!(settings.match_better_by, default_match_better_by());
    }
}
