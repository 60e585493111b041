use crate::PairwiseMatches;
use sfp_core::{DescriberType, ViewId};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The regions of several views that pairwise matching agreed are the same
/// scene point, before triangulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub describer: DescriberType,
    /// The matched region index of each view the track covers.
    pub observations: BTreeMap<ViewId, usize>,
}

/// Disjoint sets over densely numbered regions, with union by rank and path
/// halving.
struct UnionFind {
    parents: Vec<usize>,
    ranks: Vec<u8>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parents: vec![],
            ranks: vec![],
        }
    }

    fn add(&mut self) -> usize {
        let ix = self.parents.len();
        self.parents.push(ix);
        self.ranks.push(0);
        ix
    }

    fn find(&mut self, mut ix: usize) -> usize {
        while self.parents[ix] != ix {
            self.parents[ix] = self.parents[self.parents[ix]];
            ix = self.parents[ix];
        }
        ix
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        match self.ranks[a].cmp(&self.ranks[b]) {
            Ordering::Less => self.parents[a] = b,
            Ordering::Greater => self.parents[b] = a,
            Ordering::Equal => {
                self.parents[b] = a;
                self.ranks[a] += 1;
            }
        }
    }
}

/// Fuses pairwise correspondences into feature tracks by connecting regions
/// transitively across pairs.
///
/// A connected component that claims two different regions of the same view
/// contradicts itself, so the whole component is discarded. Returns the
/// surviving tracks and the number of discarded components.
pub fn build_tracks(matches: &PairwiseMatches) -> (Vec<Track>, usize) {
    let mut nodes: BTreeMap<(DescriberType, ViewId, usize), usize> = BTreeMap::new();
    let mut features: Vec<(DescriberType, ViewId, usize)> = vec![];
    let mut sets = UnionFind::new();
    for (&pair, correspondences) in matches {
        for correspondence in correspondences {
            let a_key = (correspondence.describer, pair.a(), correspondence.indices.0);
            let b_key = (correspondence.describer, pair.b(), correspondence.indices.1);
            let a_node = *nodes.entry(a_key).or_insert_with(|| {
                features.push(a_key);
                sets.add()
            });
            let b_node = *nodes.entry(b_key).or_insert_with(|| {
                features.push(b_key);
                sets.add()
            });
            sets.union(a_node, b_node);
        }
    }

    // Group regions by their component root; a `None` entry marks a
    // component poisoned by a view conflict.
    let mut components: BTreeMap<usize, Option<Track>> = BTreeMap::new();
    for (node, &(describer, view, feature)) in features.iter().enumerate() {
        let root = sets.find(node);
        let component = components.entry(root).or_insert_with(|| {
            Some(Track {
                describer,
                observations: BTreeMap::new(),
            })
        });
        if let Some(track) = component {
            if track.observations.insert(view, feature).is_some() {
                *component = None;
            }
        }
    }
    let discarded = components.values().filter(|track| track.is_none()).count();
    let tracks = components.into_values().flatten().collect();
    (tracks, discarded)
}

#[cfg(test)]
mod test {
    use super::*;
    use sfp_core::{Correspondence, FeatureMatch, Pair};

    fn correspondence(a: usize, b: usize) -> Correspondence {
        Correspondence {
            describer: DescriberType::Akaze,
            indices: FeatureMatch(a, b),
        }
    }

    #[test]
    fn chains_correspondences_across_pairs() {
        let mut matches = PairwiseMatches::new();
        matches.insert(
            Pair::new(ViewId(0), ViewId(1)),
            vec![correspondence(4, 7)],
        );
        matches.insert(
            Pair::new(ViewId(1), ViewId(2)),
            vec![correspondence(7, 1)],
        );
        let (tracks, discarded) = build_tracks(&matches);
        assert_eq!(discarded, 0);
        assert_eq!(tracks.len(), 1);
        let observations: Vec<(ViewId, usize)> = tracks[0]
            .observations
            .iter()
            .map(|(&view, &feature)| (view, feature))
            .collect();
        assert_eq!(
            observations,
            vec![(ViewId(0), 4), (ViewId(1), 7), (ViewId(2), 1)]
        );
    }

    #[test]
    fn conflicting_components_are_discarded_whole() {
        let mut matches = PairwiseMatches::new();
        // Region 0 of view 0 reaches both region 5 and region 6 of view 2
        // through view 1, so the component contradicts itself.
        matches.insert(
            Pair::new(ViewId(0), ViewId(1)),
            vec![correspondence(0, 3)],
        );
        matches.insert(
            Pair::new(ViewId(0), ViewId(2)),
            vec![correspondence(0, 5)],
        );
        matches.insert(
            Pair::new(ViewId(1), ViewId(2)),
            vec![correspondence(3, 6), correspondence(8, 9)],
        );
        let (tracks, discarded) = build_tracks(&matches);
        assert_eq!(discarded, 1);
        // The unrelated correspondence is unaffected.
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].observations[&ViewId(1)], 8);
        assert_eq!(tracks[0].observations[&ViewId(2)], 9);
    }

    #[test]
    fn describer_channels_never_mix() {
        let mut matches = PairwiseMatches::new();
        matches.insert(
            Pair::new(ViewId(0), ViewId(1)),
            vec![
                correspondence(2, 2),
                Correspondence {
                    describer: DescriberType::Orb,
                    indices: FeatureMatch(2, 2),
                },
            ],
        );
        let (tracks, discarded) = build_tracks(&matches);
        assert_eq!(discarded, 0);
        assert_eq!(tracks.len(), 2);
        assert_ne!(tracks[0].describer, tracks[1].describer);
    }
}
