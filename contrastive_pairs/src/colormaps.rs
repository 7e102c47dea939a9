use palette::Srgb;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Label-space value identifying one class: a palette color or a gray class id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKey {
    Rgb([u8; 3]),
    Gray(u8),
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKey::Rgb([r, g, b]) => write!(f, "rgb({r},{g},{b})"),
            ClassKey::Gray(v) => write!(f, "gray({v})"),
        }
    }
}

/// Ordered class keys. The position of a key is its class index and ends up
/// in output filenames, so the order must never change between runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassTable {
    keys: Vec<ClassKey>,
}

impl ClassTable {
    pub fn new(keys: Vec<ClassKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[ClassKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn index_of(&self, key: ClassKey) -> Option<usize> {
        self.keys.iter().position(|&k| k == key)
    }
}

/// PASCAL VOC 2012 palette with the black background entry removed.
const VOC_COLORS: [[u8; 3]; 20] = [
    [128, 0, 0],
    [0, 128, 0],
    [128, 128, 0],
    [0, 0, 128],
    [128, 0, 128],
    [0, 128, 128],
    [128, 128, 128],
    [64, 0, 0],
    [192, 0, 0],
    [64, 128, 0],
    [192, 128, 0],
    [64, 0, 128],
    [192, 0, 128],
    [64, 128, 128],
    [192, 128, 128],
    [0, 64, 0],
    [128, 64, 0],
    [0, 192, 0],
    [128, 192, 0],
    [0, 64, 128],
];

/// Cityscapes colors for the 19 train ids, in train-id order
/// (road, sidewalk, building, wall, fence, pole, traffic light, traffic sign,
/// vegetation, terrain, sky, person, rider, car, truck, bus, train,
/// motorcycle, bicycle).
const CITYSCAPES_COLORS: [[u8; 3]; 19] = [
    [128, 64, 128],
    [244, 35, 232],
    [70, 70, 70],
    [102, 102, 156],
    [190, 153, 153],
    [153, 153, 153],
    [250, 170, 30],
    [220, 220, 0],
    [107, 142, 35],
    [152, 251, 152],
    [70, 130, 180],
    [220, 20, 60],
    [255, 0, 0],
    [0, 0, 142],
    [0, 0, 70],
    [0, 60, 100],
    [0, 80, 100],
    [0, 0, 230],
    [119, 11, 32],
];

/// Highest valid COCO-Stuff class id; 255 marks unlabeled pixels.
pub const COCO_STUFF_MAX_ID: u8 = 181;

/// Pixel value of the object in an ADE20K per-instance mask.
pub const ADE20K_INSTANCE_VALUE: u8 = 255;

pub fn voc_table() -> ClassTable {
    ClassTable::new(VOC_COLORS.iter().map(|&c| ClassKey::Rgb(c)).collect())
}

/// SBD-augmented VOC labels: pixels of category k carry value k, 0 is background.
pub fn voc_aug_table() -> ClassTable {
    ClassTable::new((1..=20).map(ClassKey::Gray).collect())
}

pub fn coco_stuff_table() -> ClassTable {
    ClassTable::new((0..=COCO_STUFF_MAX_ID).map(ClassKey::Gray).collect())
}

pub fn ade20k_instance_table() -> ClassTable {
    ClassTable::new(vec![ClassKey::Gray(ADE20K_INSTANCE_VALUE)])
}

pub fn cityscapes_table() -> ClassTable {
    ClassTable::new(CITYSCAPES_COLORS.iter().map(|&c| ClassKey::Rgb(c)).collect())
}

pub fn named_colormap(name: &str) -> Option<ClassTable> {
    match name.to_ascii_lowercase().as_str() {
        "voc" | "voc12" | "voc2012" => Some(voc_table()),
        "voc_aug" | "sbd" => Some(voc_aug_table()),
        "coco" | "coco_stuff" | "cocostuff" => Some(coco_stuff_table()),
        "ade" | "ade20k" => Some(ade20k_instance_table()),
        "city" | "cityscapes" => Some(cityscapes_table()),
        _ => None,
    }
}

fn parse_line(line: &str) -> std::result::Result<Option<ClassKey>, String> {
    let s = line.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if let Some(hex) = s.strip_prefix('#') {
        // `#` lines that are not a 6-digit hex color are comments
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }
        let c: Srgb<u8> = s.parse().map_err(|e| format!("{s}: {e}"))?;
        return Ok(Some(ClassKey::Rgb([c.red, c.green, c.blue])));
    }
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [v] => v
            .parse::<u8>()
            .map(|v| Some(ClassKey::Gray(v)))
            .map_err(|e| format!("{s}: {e}")),
        [r, g, b] => {
            let parse = |p: &str| p.parse::<u8>().map_err(|e| format!("{s}: {e}"));
            Ok(Some(ClassKey::Rgb([parse(r)?, parse(g)?, parse(b)?])))
        }
        _ => Err(format!("unrecognised colormap entry: {s}")),
    }
}

/// Load a class table from a text file, one key per line.
/// Accepted formats: `R,G,B`, `#RRGGBB` or a single gray value `N`.
/// Blank lines and comments starting with `#` are ignored.
pub fn load_colormap_file(path: &Path) -> Result<ClassTable> {
    let f = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let mut keys = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.map_err(|e| ConvertError::io(path, e))?;
        let key = parse_line(&line)
            .map_err(|msg| ConvertError::Config(format!("{}: {msg}", path.display())))?;
        keys.extend(key);
    }
    if keys.is_empty() {
        return Err(ConvertError::Config(format!(
            "no class keys parsed from colormap file: {}",
            path.display()
        )));
    }
    Ok(ClassTable::new(keys))
}
