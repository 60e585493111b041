use derive_more::{Display, From, Into};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Identifies one view (input image) of the scene.
///
/// Identifiers are assigned by whatever produced the scene dataset and are
/// never re-numbered by this pipeline.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into,
)]
#[display(fmt = "{}", _0)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ViewId(pub u32);

/// Identifies one camera intrinsic model, possibly shared by several views.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into,
)]
#[display(fmt = "{}", _0)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IntrinsicId(pub u32);

/// Identifies one camera pose, possibly shared by several views (rig case).
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into,
)]
#[display(fmt = "{}", _0)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PoseId(pub u32);

/// An unordered pair of views, canonicalized so the lower identifier comes
/// first. Construct it through [`Pair::new`] so that `(a, b)` and `(b, a)`
/// compare and hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Pair(ViewId, ViewId);

impl Pair {
    /// Creates a canonical pair from two views in either order.
    pub fn new(a: ViewId, b: ViewId) -> Self {
        if b < a {
            Self(b, a)
        } else {
            Self(a, b)
        }
    }

    /// The lower view identifier.
    pub fn a(self) -> ViewId {
        self.0
    }

    /// The higher view identifier.
    pub fn b(self) -> ViewId {
        self.1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pair_is_canonical() {
        let ab = Pair::new(ViewId(3), ViewId(7));
        let ba = Pair::new(ViewId(7), ViewId(3));
        assert_eq!(ab, ba);
        assert_eq!(ab.a(), ViewId(3));
        assert_eq!(ab.b(), ViewId(7));
    }
}
