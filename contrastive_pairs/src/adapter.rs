//! Per-file pipeline: locate companion -> decode -> filter -> composite.

use image::RgbImage;
use log::{debug, error, warn};
use std::path::{Path, PathBuf};

use crate::colormaps::ClassTable;
use crate::composite::{write_pair, PairPaths, WriteOutcome};
use crate::dataset::{Dataset, LabelSource, Sample};
use crate::decode::{decode_all, open_image, BinaryMask, LabelKind, LabelMask};
use crate::error::{ConvertError, Result};
use crate::filter::AreaFilter;
use crate::progress::Progress;

/// What a worker does when a file's companion is missing or unreadable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Log the file, record it in the shard report and carry on.
    #[default]
    Skip,
    /// Stop the worker's shard at the first such file.
    Abort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDirs {
    pub pairs: PathBuf,
    /// Set when intermediate binary masks are kept.
    pub binmasks: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    /// Classes that passed the area filter.
    pub accepted: usize,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct ShardReport {
    pub files_completed: usize,
    pub pairs_written: usize,
    pub pairs_skipped: usize,
    /// Files passed over under [`MissingPolicy::Skip`], with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Error that stopped the shard early.
    pub aborted: Option<ConvertError>,
}

impl ShardReport {
    fn add(&mut self, report: FileReport) {
        self.files_completed += 1;
        self.pairs_written += report.written;
        self.pairs_skipped += report.skipped;
    }
}

/// One dataset strategy with its injected class table and output settings.
#[derive(Clone, Debug)]
pub struct Adapter {
    dataset: Dataset,
    root: PathBuf,
    table: ClassTable,
    filter: AreaFilter,
    dirs: OutputDirs,
    policy: MissingPolicy,
}

impl Adapter {
    pub fn new(dataset: Dataset, root: impl Into<PathBuf>, dirs: OutputDirs) -> Self {
        Self {
            dataset,
            root: root.into(),
            table: dataset.default_table(),
            filter: AreaFilter::default(),
            dirs,
            policy: MissingPolicy::default(),
        }
    }

    pub fn with_table(mut self, table: ClassTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_filter(mut self, filter: AreaFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_policy(mut self, policy: MissingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn paths(&self, stem: &str, index: usize) -> PairPaths {
        PairPaths::new(
            &self.dirs.pairs,
            self.dirs.binmasks.as_deref(),
            stem,
            index,
            self.dataset.extension(),
        )
    }

    fn open_label(&self, path: &Path, kind: LabelKind, raw: &RgbImage) -> Result<LabelMask> {
        let label = LabelMask::open(path, kind)?;
        if label.dimensions() != raw.dimensions() {
            return Err(ConvertError::DimensionMismatch {
                path: path.to_path_buf(),
                mask: label.dimensions(),
                raw: raw.dimensions(),
            });
        }
        Ok(label)
    }

    fn emit(
        &self,
        raw: &RgbImage,
        mask: &BinaryMask,
        stem: &str,
        index: usize,
        report: &mut FileReport,
    ) -> Result<()> {
        if !self.filter.accepts(mask) {
            return Ok(());
        }
        report.accepted += 1;
        match write_pair(raw, mask, &self.paths(stem, index))? {
            WriteOutcome::Written => report.written += 1,
            WriteOutcome::Skipped => report.skipped += 1,
        }
        Ok(())
    }

    /// Run the whole pipeline for one worklist entry.
    pub fn process_file(&self, input: &Path) -> Result<FileReport> {
        let Sample { stem, raw, labels } = self.dataset.locate(input, &self.root)?;
        let raw = open_image(&raw)?.into_rgb8();
        let kind = self.dataset.label_kind();
        let mut report = FileReport::default();

        match labels {
            LabelSource::Mask(path) => {
                let label = self.open_label(&path, kind, &raw)?;
                for (index, mask) in decode_all(&label, &self.table).iter().enumerate() {
                    self.emit(&raw, mask, &stem, index, &mut report)?;
                }
            }
            LabelSource::Instances(paths) => {
                for (index, path) in paths.iter().enumerate() {
                    let label = self.open_label(path, kind, &raw)?;
                    let mask = union(decode_all(&label, &self.table), raw.dimensions());
                    self.emit(&raw, &mask, &stem, index, &mut report)?;
                }
            }
        }
        debug!("{:?}: {:?}", input, report);
        Ok(report)
    }

    /// Process a shard sequentially. Per-file failures follow the
    /// [`MissingPolicy`]; any other error ends the shard.
    pub fn run_shard(&self, shard: &[PathBuf], progress: Option<&Progress>) -> ShardReport {
        let mut shard_report = ShardReport::default();
        for input in shard {
            match self.process_file(input) {
                Ok(report) => shard_report.add(report),
                Err(e) if e.is_item_failure() && self.policy == MissingPolicy::Skip => {
                    warn!("[{}] skipping {:?}: {}", self.dataset, input, e);
                    shard_report.failed.push((input.clone(), e.to_string()));
                }
                Err(e) => {
                    error!("[{}] worker stopped at {:?}: {}", self.dataset, input, e);
                    shard_report.aborted = Some(e);
                    break;
                }
            }
            if let Some(p) = progress {
                p.tick();
            }
        }
        shard_report
    }
}

/// Instance masks count as one region even when the table holds several keys.
fn union(masks: Vec<BinaryMask>, (w, h): (u32, u32)) -> BinaryMask {
    masks
        .into_iter()
        .reduce(|acc, m| {
            let bits = acc.bits().iter().zip(m.bits()).map(|(a, b)| *a || *b).collect();
            BinaryMask::from_bits(w, h, bits).unwrap_or(acc)
        })
        .unwrap_or_else(|| BinaryMask::new(w, h))
}
