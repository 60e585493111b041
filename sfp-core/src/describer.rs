use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The feature describer that produced a region, a correspondence, or a
/// landmark. Views can carry regions from several describers at once, and
/// each channel is matched independently of the others.
///
/// All describers in this pipeline produce 512-bit binary descriptors
/// compared under the Hamming metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DescriberType {
    /// AKAZE keypoints with M-LDB binary descriptors.
    Akaze,
    /// ORB keypoints with BRIEF binary descriptors.
    Orb,
}

impl DescriberType {
    /// The lowercase name used in region file names and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            DescriberType::Akaze => "akaze",
            DescriberType::Orb => "orb",
        }
    }
}

impl fmt::Display for DescriberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a describer name is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownDescriberType;

impl fmt::Display for UnknownDescriberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown describer type (expected \"akaze\" or \"orb\")")
    }
}

impl FromStr for DescriberType {
    type Err = UnknownDescriberType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("akaze") {
            Ok(DescriberType::Akaze)
        } else if s.eq_ignore_ascii_case("orb") {
            Ok(DescriberType::Orb)
        } else {
            Err(UnknownDescriberType)
        }
    }
}
