use sfp_core::{DescriberType, ViewId};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The input errors of the pipeline collaborators.
///
/// Only unreadable or malformed inputs surface here. Degenerate geometry
/// (empty pair sets, rejected tracks, discarded landmarks) is handled by
/// exclusion and reported through logged counts instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error(
        "regions of view {view} for describer {describer} are corrupt: \
         {key_points} keypoints but {descriptors} descriptors"
    )]
    CorruptRegions {
        view: ViewId,
        describer: DescriberType,
        key_points: usize,
        descriptors: usize,
    },
    #[error("matches file {0} does not exist")]
    MissingMatches(PathBuf),
}
