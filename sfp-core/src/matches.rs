use crate::DescriberType;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A putative tie between a feature in one view and a feature in another.
///
/// The payload is generic: region indices during correspondence search,
/// keypoints or normalized keypoints once positions are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FeatureMatch<P>(pub P, pub P);

/// A [`FeatureMatch`] of region indices together with the describer channel
/// that produced it. This is the unit that flows from correspondence search
/// into geometric filtering and track building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub describer: DescriberType,
    pub indices: FeatureMatch<usize>,
}
