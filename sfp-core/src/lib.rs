//! # sfp-core
//!
//! This library provides the common abstractions and types shared by the
//! structure-from-poses crates. The pipeline recovers 3d scene structure from
//! cameras whose poses and calibrations are already known, so the vocabulary
//! here revolves around identifiers for scene entities, image keypoints,
//! homogeneous projective points, and rigid pose transformations between the
//! world frame and camera frames.
//!
//! The crate is designed to work with `#![no_std]`, even without an allocator,
//! so that the geometry crates built on top of it can run anywhere.
//!
//! ## Triangulation
//!
//! The [`TriangulatorObservations`] trait is the seam through which 3d points
//! are recovered. Every observation is a camera pose plus a bearing: the unit
//! direction, in that camera's frame, from the optical center towards the
//! feature. With two or more observations of the same physical point from
//! known poses, a triangulator solves for the point the bearings (nearly)
//! intersect at:
//!
//! - `p` the point being triangulated
//! - `a` and `b` the observed normalized image coordinates
//! - `O` the optical center of a camera
//! - `@` the virtual image plane
//!
//! ```text
//!                        @
//!                        @
//!               p--------b--------O
//!              /         @
//!             /          @
//!            /           @
//!           /            @
//!   @@@@@@@a@@@@@
//!         /
//!        /
//!       /
//!      O
//! ```
//!
//! Because the poses are known inputs rather than estimates, bearings that
//! fail to intersect are rejected by the triangulator rather than fed into
//! any pose refinement.

#![no_std]

mod camera;
mod describer;
mod ids;
mod keypoint;
mod matches;
mod model;
mod point;
mod pose;
mod triangulation;

pub use camera::*;
pub use describer::*;
pub use ids::*;
pub use keypoint::*;
pub use matches::*;
pub use model::*;
pub use nalgebra;
pub use point::*;
pub use pose::*;
pub use triangulation::*;
