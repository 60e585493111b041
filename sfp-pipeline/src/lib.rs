//! Structure estimation for scenes whose camera poses are already known.
//!
//! Given a scene with calibrated, posed views and the detected regions of
//! each view, this crate searches candidate view pairs for correspondences
//! consistent with the epipolar geometry the poses imply, fuses them into
//! feature tracks, and triangulates each track into a landmark. The poses
//! themselves are never modified; this is the structure half of
//! structure-from-motion, run after localization has already happened.
//!
//! The stages are exposed individually ([`PairSelector`],
//! [`StructureEstimator::match_pairs`], [`StructureEstimator::filter_matches`],
//! [`StructureEstimator::triangulate`], [`remove_outliers_by_angle`]) and
//! bundled into [`StructureEstimator::estimate_structure`] for the common
//! path.

mod error;
mod estimate;
mod export;
mod matches;
mod outliers;
mod pairs;
mod regions;
mod scene;
mod settings;
mod tracks;

pub use error::*;
pub use estimate::*;
pub use export::*;
pub use matches::*;
pub use outliers::*;
pub use pairs::*;
pub use regions::*;
pub use scene::*;
pub use settings::*;
pub use tracks::*;
