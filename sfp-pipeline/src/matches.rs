use crate::{Error, Result};
use log::info;
use sfp_core::{Correspondence, GeometricModel, Pair};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Correspondences between region indices, grouped by view pair.
pub type PairwiseMatches = BTreeMap<Pair, Vec<Correspondence>>;

/// Loads `matches.<model>.bin` from a directory of precomputed matches.
///
/// Pairs are re-canonicalized on load so lookups never depend on the order
/// the producer wrote the views in.
pub fn load_matches(directory: impl AsRef<Path>, model: GeometricModel) -> Result<PairwiseMatches> {
    let path = directory.as_ref().join(format!("matches.{}.bin", model));
    if !path.exists() {
        return Err(Error::MissingMatches(path));
    }
    let listed: Vec<(Pair, Vec<Correspondence>)> =
        bincode::deserialize_from(BufReader::new(File::open(&path)?))?;
    let matches: PairwiseMatches = listed
        .into_iter()
        .map(|(pair, correspondences)| (Pair::new(pair.a(), pair.b()), correspondences))
        .collect();
    info!(
        "loaded matches of {} pairs from {}",
        matches.len(),
        path.display()
    );
    Ok(matches)
}

/// Writes matches in the format [`load_matches`] reads.
pub fn save_matches(
    directory: impl AsRef<Path>,
    model: GeometricModel,
    matches: &PairwiseMatches,
) -> Result<()> {
    let path = directory.as_ref().join(format!("matches.{}.bin", model));
    let listed: Vec<(&Pair, &Vec<Correspondence>)> = matches.iter().collect();
    bincode::serialize_into(BufWriter::new(File::create(path)?), &listed)?;
    Ok(())
}
