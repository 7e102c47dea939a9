//! Dataset root validation and worklist construction.

use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::dataset::Dataset;
use crate::error::{ConvertError, Result};

pub const COCO_MASK_LIST: &str = "coco_train_gray_masks.txt";
pub const ADE_IMAGE_LIST: &str = "ade_train_imgs.txt";

/// A validated dataset root and the files to feed the adapters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worklist {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

fn config_err(msg: String) -> ConvertError {
    ConvertError::Config(msg)
}

/// First directory under `root` (in sorted walk order) whose path contains
/// `needle`, or `root` itself when it already does.
fn find_dir(root: &Path, needle: &str) -> Option<PathBuf> {
    if root.to_string_lossy().contains(needle) {
        return Some(root.to_path_buf());
    }
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .find(|p| p.to_string_lossy().contains(needle))
}

/// Files under `dir` whose name satisfies `keep`, sorted.
fn scan(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(&keep))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Reuse a cached file list, or build it with `build` and cache it.
pub fn cached_list(cache: Option<&Path>, build: impl FnOnce() -> Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if let Some(cache) = cache.filter(|c| c.exists()) {
        info!(
            "Using list {:?}. Delete the file to re-index or after moving the dataset root.",
            cache
        );
        return Ok(read_lines(cache)?.into_iter().map(PathBuf::from).collect());
    }
    info!("Indexing files. This may take a while.");
    let files = build();
    if let Some(cache) = cache {
        let mut f = fs::File::create(cache).map_err(|e| ConvertError::io(cache, e))?;
        for p in &files {
            writeln!(f, "{}", p.display()).map_err(|e| ConvertError::io(cache, e))?;
        }
    }
    Ok(files)
}

pub fn find_voc_root(root: &Path) -> Result<PathBuf> {
    find_dir(root, "VOC2012").ok_or_else(|| {
        config_err(format!(
            "cannot find a VOC2012 folder under {}",
            root.display()
        ))
    })
}

/// Masks named by the training image-set list that exist on disk.
pub fn voc_worklist(voc_root: &Path, augmented: bool) -> Result<Vec<PathBuf>> {
    let (mask_dir, list) = if augmented {
        (
            voc_root.join("SegmentationClassAug"),
            voc_root.join("ImageSets").join("SegmentationAug").join("train_aug.txt"),
        )
    } else {
        (
            voc_root.join("SegmentationClass"),
            voc_root.join("ImageSets").join("Segmentation").join("train.txt"),
        )
    };
    for p in [&mask_dir, &list] {
        if !p.exists() {
            return Err(config_err(format!("{} does not exist", p.display())));
        }
    }
    let names: Vec<String> = read_lines(&list)?
        .into_iter()
        .map(|line| {
            if augmented {
                // `/JPEGImages/x.jpg /SegmentationClassAug/x.png`
                let label = line.split_whitespace().last().unwrap_or(&line).to_owned();
                Path::new(&label)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or(label)
            } else {
                line
            }
        })
        .collect();
    info!("{} training samples retrieved.", names.len());
    Ok(names
        .iter()
        .map(|n| mask_dir.join(format!("{n}.png")))
        .filter(|p| p.exists())
        .collect())
}

pub fn coco_mask_dir(root: &Path) -> PathBuf {
    root.join("stuffthingmaps_trainval2017").join("train2017")
}

pub fn check_coco_root(root: &Path) -> Result<()> {
    for dir in [root.join("train2017"), coco_mask_dir(root)] {
        if !dir.is_dir() {
            return Err(config_err(format!("cannot find {}", dir.display())));
        }
    }
    Ok(())
}

pub fn coco_worklist(root: &Path, cache: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mask_dir = coco_mask_dir(root);
    cached_list(cache, || scan(&mask_dir, |n| n.ends_with(".png")))
}

pub fn find_ade_training(root: &Path) -> Result<PathBuf> {
    let needle = Path::new("images").join("ADE").join("training");
    find_dir(root, &needle.to_string_lossy()).ok_or_else(|| {
        config_err(format!(
            "cannot find {} under {}",
            needle.display(),
            root.display()
        ))
    })
}

pub fn ade_worklist(training: &Path, cache: Option<&Path>) -> Result<Vec<PathBuf>> {
    cached_list(cache, || scan(training, |n| n.ends_with(".jpg")))
}

/// `(gtFine/train, leftImg8bit/train)` under a Cityscapes root.
pub fn cityscapes_dirs(root: &Path) -> Result<(PathBuf, PathBuf)> {
    let entries = fs::read_dir(root).map_err(|e| ConvertError::io(root, e))?;
    let mut labels = None;
    let mut images = None;
    for path in entries.filter_map(|e| Some(e.ok()?.path())).filter(|p| p.is_dir()) {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.contains("gtFine") {
            labels = Some(path.join("train"));
        } else if name.contains("leftImg8bit") {
            images = Some(path.join("train"));
        }
    }
    match (labels, images) {
        (Some(l), Some(i)) if l.is_dir() && i.is_dir() => Ok((l, i)),
        _ => Err(config_err(format!(
            "{} must contain gtFine/train and leftImg8bit/train",
            root.display()
        ))),
    }
}

pub fn cityscapes_worklist(image_dir: &Path) -> Vec<PathBuf> {
    scan(image_dir, |n| n.ends_with("_leftImg8bit.png"))
}

/// Validate `root` for `dataset` and list its inputs. `cache_dir` holds the
/// cached file lists of the slow-to-scan datasets.
pub fn resolve(dataset: Dataset, root: &Path, cache_dir: Option<&Path>) -> Result<Worklist> {
    match dataset {
        Dataset::Voc { augmented } => {
            let root = find_voc_root(root)?;
            info!("Found VOC2012 folder at {:?}", root);
            let files = voc_worklist(&root, augmented)?;
            Ok(Worklist { root, files })
        }
        Dataset::CocoStuff => {
            check_coco_root(root)?;
            let cache = cache_dir.map(|d| d.join(COCO_MASK_LIST));
            let files = coco_worklist(root, cache.as_deref())?;
            Ok(Worklist {
                root: root.to_path_buf(),
                files,
            })
        }
        Dataset::Ade20k => {
            let training = find_ade_training(root)?;
            info!("Found ADE20K training folder at {:?}", training);
            let cache = cache_dir.map(|d| d.join(ADE_IMAGE_LIST));
            let files = ade_worklist(&training, cache.as_deref())?;
            Ok(Worklist {
                root: training,
                files,
            })
        }
        Dataset::Cityscapes => {
            let (_, images) = cityscapes_dirs(root)?;
            Ok(Worklist {
                root: root.to_path_buf(),
                files: cityscapes_worklist(&images),
            })
        }
    }
}
