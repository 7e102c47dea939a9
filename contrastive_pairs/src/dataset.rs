//! Per-dataset strategies: where the companion files live, how labels are
//! encoded and how outputs are named.

use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::colormaps::{
    ade20k_instance_table, cityscapes_table, coco_stuff_table, voc_aug_table, voc_table,
    ClassTable,
};
use crate::decode::LabelKind;
use crate::error::{ConvertError, Result};

pub const CITYSCAPES_RAW_TOKEN: &str = "leftImg8bit";
pub const CITYSCAPES_LABEL_TOKEN: &str = "gtFine";
pub const CITYSCAPES_COLOR_MARKER: &str = "_color";
pub const ADE20K_INSTANCE_MARKER: &str = "instance_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataset {
    /// PASCAL VOC 2012. `augmented` selects the SBD `SegmentationClassAug`
    /// gray-id labels instead of the palette PNGs.
    Voc { augmented: bool },
    CocoStuff,
    Ade20k,
    Cityscapes,
}

/// Where the label data of one sample comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelSource {
    /// One label mask decoded against the class table.
    Mask(PathBuf),
    /// Per-instance masks, each one its own class for naming.
    Instances(Vec<PathBuf>),
}

/// A located input: raw photo, its labels and the stem used for outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub stem: String,
    pub raw: PathBuf,
    pub labels: LabelSource,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn require(input: &Path, companion: PathBuf) -> Result<PathBuf> {
    if companion.exists() {
        Ok(companion)
    } else {
        Err(ConvertError::MissingCompanion {
            input: input.to_path_buf(),
            companion,
        })
    }
}

/// `.../leftImg8bit/train/x/x_000000_000019_leftImg8bit.png` becomes
/// `.../gtFine/train/x/x_000000_000019_gtFine_color.png`.
pub fn cityscapes_label_path(raw: &Path) -> PathBuf {
    let replaced = raw
        .to_string_lossy()
        .replace(CITYSCAPES_RAW_TOKEN, CITYSCAPES_LABEL_TOKEN);
    let mut label = PathBuf::from(replaced);
    let stem = file_stem(&label);
    label.set_file_name(format!("{stem}{CITYSCAPES_COLOR_MARKER}.png"));
    label
}

/// Instance masks of an ADE20K image, searched recursively and listed in
/// sorted walk order so that the instance index is the same on every run.
pub fn ade20k_instance_masks(mask_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut masks = Vec::new();
    for entry in WalkDir::new(mask_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ConvertError::io(mask_dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_png = path.extension().and_then(|e| e.to_str()) == Some("png");
        let is_instance = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(ADE20K_INSTANCE_MARKER));
        if is_png && is_instance {
            masks.push(path);
        }
    }
    Ok(masks)
}

impl Dataset {
    /// Find the companion files for one worklist entry. For VOC and
    /// COCO-Stuff `input` is a label mask, for ADE20K and Cityscapes it is
    /// the raw photo.
    pub fn locate(&self, input: &Path, root: &Path) -> Result<Sample> {
        match self {
            Dataset::Voc { .. } => {
                let stem = file_stem(input);
                let raw = require(input, root.join("JPEGImages").join(format!("{stem}.jpg")))?;
                let label = require(input, input.to_path_buf())?;
                Ok(Sample {
                    stem,
                    raw,
                    labels: LabelSource::Mask(label),
                })
            }
            Dataset::CocoStuff => {
                let stem = file_stem(input);
                let raw = require(input, root.join("train2017").join(format!("{stem}.jpg")))?;
                let label = require(input, input.to_path_buf())?;
                Ok(Sample {
                    stem,
                    raw,
                    labels: LabelSource::Mask(label),
                })
            }
            Dataset::Ade20k => {
                let raw = require(input, input.to_path_buf())?;
                let stem = file_stem(input);
                let parent = input.parent().unwrap_or_else(|| Path::new(""));
                let mask_dir = require(input, parent.join(&stem))?;
                Ok(Sample {
                    stem,
                    raw,
                    labels: LabelSource::Instances(ade20k_instance_masks(&mask_dir)?),
                })
            }
            Dataset::Cityscapes => {
                let raw = require(input, input.to_path_buf())?;
                let label = require(input, cityscapes_label_path(input))?;
                Ok(Sample {
                    stem: file_stem(&label),
                    raw,
                    labels: LabelSource::Mask(label),
                })
            }
        }
    }

    pub fn default_table(&self) -> ClassTable {
        match self {
            Dataset::Voc { augmented: false } => voc_table(),
            Dataset::Voc { augmented: true } => voc_aug_table(),
            Dataset::CocoStuff => coco_stuff_table(),
            Dataset::Ade20k => ade20k_instance_table(),
            Dataset::Cityscapes => cityscapes_table(),
        }
    }

    pub fn label_kind(&self) -> LabelKind {
        match self {
            Dataset::Voc { augmented: false } | Dataset::Cityscapes => LabelKind::Rgb,
            Dataset::Voc { augmented: true } | Dataset::CocoStuff | Dataset::Ade20k => {
                LabelKind::Gray
            }
        }
    }

    /// Cityscapes outputs stay lossless.
    pub fn extension(&self) -> &'static str {
        match self {
            Dataset::Cityscapes => "png",
            _ => "jpg",
        }
    }

    pub fn output_subdir(&self) -> &'static str {
        match self {
            Dataset::Voc { .. } => "voc",
            Dataset::CocoStuff => "coco",
            Dataset::Ade20k => "ade20k",
            Dataset::Cityscapes => "cityscapes",
        }
    }

    pub fn manifest_name(&self) -> &'static str {
        match self {
            Dataset::Voc { .. } => "VOC_ImgList.txt",
            Dataset::CocoStuff => "COCO_ImgList.txt",
            Dataset::Ade20k => "ADE_ImgList.txt",
            Dataset::Cityscapes => "Cityscapes_ImgList.txt",
        }
    }

    /// Files between two progress reports.
    pub fn progress_every(&self) -> usize {
        match self {
            Dataset::Cityscapes => 20,
            _ => 100,
        }
    }

    /// VOC image-set lists are dealt out round-robin; scanned worklists are
    /// cut into contiguous chunks.
    pub fn round_robin(&self) -> bool {
        matches!(self, Dataset::Voc { .. })
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Voc { augmented: false } => write!(f, "VOC2012"),
            Dataset::Voc { augmented: true } => write!(f, "VOC2012-aug"),
            Dataset::CocoStuff => write!(f, "COCO"),
            Dataset::Ade20k => write!(f, "ADE20k"),
            Dataset::Cityscapes => write!(f, "Cityscapes"),
        }
    }
}
