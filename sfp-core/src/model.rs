use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The epipolar model used to validate putative correspondences of a posed
/// image pair.
///
/// All three models are derived in closed form from the known poses and
/// intrinsics of the pair rather than estimated from the matches themselves,
/// so validation is a pure residual-threshold test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum GeometricModel {
    /// The fundamental matrix. Residuals are symmetric epipolar line
    /// distances in pixels. This is the appropriate default for pairs with
    /// baseline.
    Fundamental,
    /// The essential matrix. Residuals are algebraic epipolar errors on
    /// calibrated coordinates, scaled by the mean focal length so that the
    /// threshold can still be given in pixels.
    Essential,
    /// The homography induced by the plane at infinity. Residuals are
    /// transfer distances in pixels. Appropriate for pure-rotation pairs and
    /// far-away structure.
    Homography,
}

impl GeometricModel {
    /// The single-letter name used in match file names and on the command
    /// line.
    pub fn name(self) -> &'static str {
        match self {
            GeometricModel::Fundamental => "f",
            GeometricModel::Essential => "e",
            GeometricModel::Homography => "h",
        }
    }
}

impl fmt::Display for GeometricModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a geometric model name is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownGeometricModel;

impl fmt::Display for UnknownGeometricModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown geometric model (expected \"f\", \"e\", or \"h\")")
    }
}

impl FromStr for GeometricModel {
    type Err = UnknownGeometricModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("f") {
            Ok(GeometricModel::Fundamental)
        } else if s.eq_ignore_ascii_case("e") {
            Ok(GeometricModel::Essential)
        } else if s.eq_ignore_ascii_case("h") {
            Ok(GeometricModel::Homography)
        } else {
            Err(UnknownGeometricModel)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_single_letter_names() {
        assert_eq!("f".parse(), Ok(GeometricModel::Fundamental));
        assert_eq!("E".parse(), Ok(GeometricModel::Essential));
        assert_eq!("h".parse(), Ok(GeometricModel::Homography));
        assert_eq!(
            "fundamental".parse::<GeometricModel>(),
            Err(UnknownGeometricModel)
        );
    }
}
