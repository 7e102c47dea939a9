use image::{io::Reader as ImageReader, DynamicImage, GrayImage, Luma, RgbImage};
use std::path::Path;

use crate::colormaps::{ClassKey, ClassTable};
use crate::error::{ConvertError, Result};

/// Binary-mask value used when a mask is persisted as an image.
pub const MASK_ON: u8 = u8::MAX;
pub const MASK_OFF: u8 = 0;

/// How the pixels of a label mask are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    /// Palette colors, compared on all three channels.
    Rgb,
    /// Single-channel class ids.
    Gray,
}

#[derive(Clone, Debug)]
pub enum LabelMask {
    Rgb(RgbImage),
    Gray(GrayImage),
}

impl LabelMask {
    pub fn from_dynamic(img: DynamicImage, kind: LabelKind) -> Self {
        match kind {
            LabelKind::Rgb => LabelMask::Rgb(img.into_rgb8()),
            LabelKind::Gray => LabelMask::Gray(img.into_luma8()),
        }
    }

    pub fn open(path: &Path, kind: LabelKind) -> Result<Self> {
        Ok(Self::from_dynamic(open_image(path)?, kind))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            LabelMask::Rgb(img) => img.dimensions(),
            LabelMask::Gray(img) => img.dimensions(),
        }
    }
}

/// Decode any image file, mapping a missing file and an unreadable one to
/// their own error variants.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::MissingCompanion {
            input: path.to_path_buf(),
            companion: path.to_path_buf(),
        },
        _ => ConvertError::io(path, e),
    })?;
    reader
        .with_guessed_format()
        .map_err(|e| ConvertError::io(path, e))?
        .decode()
        .map_err(|source| ConvertError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Per-class boolean raster, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Option<Self> {
        (bits.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            bits,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn area(&self) -> usize {
        self.bits.len()
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn inverted(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    pub fn to_gray(&self) -> GrayImage {
        let raw = self
            .bits
            .iter()
            .map(|&b| if b { MASK_ON } else { MASK_OFF })
            .collect();
        // length matches width * height by construction
        GrayImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| GrayImage::from_pixel(self.width, self.height, Luma([MASK_OFF])))
    }
}

/// AND one channel-equality pass into `acc`.
#[inline]
fn and_channel(acc: &mut [bool], samples: &[u8], stride: usize, channel: usize, value: u8) {
    for (bit, px) in acc.iter_mut().zip(samples.chunks_exact(stride)) {
        *bit = *bit && px[channel] == value;
    }
}

/// Pixels of `label` exactly equal to `key`. A color key never matches a
/// gray mask and a gray key never matches a color mask.
pub fn decode_class_mask(label: &LabelMask, key: ClassKey) -> BinaryMask {
    let (w, h) = label.dimensions();
    match (label, key) {
        (LabelMask::Rgb(img), ClassKey::Rgb(rgb)) => {
            let mut bits = vec![true; w as usize * h as usize];
            let raw = img.as_raw();
            for (channel, &value) in rgb.iter().enumerate() {
                and_channel(&mut bits, raw, 3, channel, value);
            }
            BinaryMask {
                width: w,
                height: h,
                bits,
            }
        }
        (LabelMask::Gray(img), ClassKey::Gray(v)) => BinaryMask {
            width: w,
            height: h,
            bits: img.as_raw().iter().map(|&p| p == v).collect(),
        },
        _ => BinaryMask::new(w, h),
    }
}

/// One mask per key of `table`, in table order.
pub fn decode_all(label: &LabelMask, table: &ClassTable) -> Vec<BinaryMask> {
    table
        .keys()
        .iter()
        .map(|&key| decode_class_mask(label, key))
        .collect()
}
