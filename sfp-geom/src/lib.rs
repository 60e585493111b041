//! # sfp-geom
//!
//! The geometric toolbox for structure estimation with known camera poses.
//!
//! This crate contains the pieces of the pipeline that are pure geometry:
//!
//! * [`Frustum`], the world-space viewing volume of a posed camera, with a
//!   conservative intersection test used to decide which image pairs can see
//!   common structure at all.
//! * The epipolar models ([`EssentialMatrix`], [`FundamentalMatrix`], and
//!   [`InfiniteHomography`]) together with [`PairGeometry`], which evaluates
//!   a pixel-space residual for a putative correspondence under whichever
//!   model was requested.
//! * [`DltTriangulator`], a multi-view linear triangulator that recovers a
//!   [`WorldPoint`](sfp_core::WorldPoint) from two or more bearings with
//!   known poses.
//! * Parallax helpers used to reject structure that is too poorly
//!   conditioned to keep.
//!
//! Everything here is `no_std` and allocation-free so it can be reused in
//! embedded or wasm contexts.

#![no_std]

mod epipolar;
mod frustum;
mod parallax;
mod triangulation;

pub use epipolar::*;
pub use frustum::*;
pub use parallax::*;
pub use triangulation::*;
