use crate::{Error, Result, Scene};
use bitarray::BitArray;
use log::{debug, info};
use sfp_core::{DescriberType, KeyPoint, ViewId};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// The regions of one view for one describer channel: a keypoint and a
/// 512-bit binary descriptor per detected feature, stored as parallel
/// arrays indexed by region index.
#[derive(Debug, Clone, Default)]
pub struct ViewRegions {
    pub key_points: Vec<KeyPoint>,
    pub descriptors: Vec<BitArray<64>>,
}

impl ViewRegions {
    pub fn len(&self) -> usize {
        self.key_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_points.is_empty()
    }
}

/// All regions available to one pipeline run, indexed by view and describer
/// channel.
///
/// The pipeline reads regions but never creates them; they are produced by a
/// feature extraction tool and persisted as one `<view>.<describer>.feat`
/// and one `<view>.<describer>.desc` bincode file per view and channel.
#[derive(Debug, Clone, Default)]
pub struct RegionsPerView {
    regions: BTreeMap<(ViewId, DescriberType), ViewRegions>,
}

impl RegionsPerView {
    /// Loads the regions of every valid view of the scene for the requested
    /// describer channels.
    ///
    /// A view with no `.feat` file for a channel simply has no regions there
    /// and will contribute no correspondences. A `.feat` file whose `.desc`
    /// companion is missing or disagrees on the feature count is an input
    /// error.
    pub fn load(
        directory: impl AsRef<Path>,
        scene: &Scene,
        describers: &[DescriberType],
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let mut regions = BTreeMap::new();
        for view in scene.valid_views() {
            for &describer in describers {
                let feat_path = directory.join(format!("{}.{}.feat", view, describer));
                if !feat_path.exists() {
                    debug!("view {} has no {} regions", view, describer);
                    continue;
                }
                let desc_path = directory.join(format!("{}.{}.desc", view, describer));
                let key_points: Vec<KeyPoint> =
                    bincode::deserialize_from(BufReader::new(File::open(feat_path)?))?;
                let descriptors: Vec<BitArray<64>> =
                    bincode::deserialize_from(BufReader::new(File::open(desc_path)?))?;
                if key_points.len() != descriptors.len() {
                    return Err(Error::CorruptRegions {
                        view,
                        describer,
                        key_points: key_points.len(),
                        descriptors: descriptors.len(),
                    });
                }
                regions.insert(
                    (view, describer),
                    ViewRegions {
                        key_points,
                        descriptors,
                    },
                );
            }
        }
        info!(
            "loaded regions of {} view/describer combinations",
            regions.len()
        );
        Ok(Self { regions })
    }

    /// Writes every region set back out in the format [`RegionsPerView::load`]
    /// reads.
    pub fn save(&self, directory: impl AsRef<Path>) -> Result<()> {
        let directory = directory.as_ref();
        for ((view, describer), regions) in &self.regions {
            let feat_path = directory.join(format!("{}.{}.feat", view, describer));
            bincode::serialize_into(BufWriter::new(File::create(feat_path)?), &regions.key_points)?;
            let desc_path = directory.join(format!("{}.{}.desc", view, describer));
            bincode::serialize_into(
                BufWriter::new(File::create(desc_path)?),
                &regions.descriptors,
            )?;
        }
        Ok(())
    }

    /// Adds the regions of one view and channel, replacing any previous set.
    pub fn insert(&mut self, view: ViewId, describer: DescriberType, regions: ViewRegions) {
        self.regions.insert((view, describer), regions);
    }

    pub fn get(&self, view: ViewId, describer: DescriberType) -> Option<&ViewRegions> {
        self.regions.get(&(view, describer))
    }

    /// The pixel position of one region.
    pub fn key_point(
        &self,
        view: ViewId,
        describer: DescriberType,
        feature: usize,
    ) -> Option<KeyPoint> {
        self.get(view, describer)?.key_points.get(feature).copied()
    }

    /// Releases all descriptor storage, keeping the keypoints.
    ///
    /// Descriptors are only needed during correspondence search, and for
    /// large scenes they dominate memory, so the pipeline drops them before
    /// triangulation.
    pub fn clear_descriptors(&mut self) {
        for regions in self.regions.values_mut() {
            regions.descriptors = Vec::new();
        }
    }
}
