use image::{ImageBuffer, Rgb, RgbImage};
use log::debug;
use std::path::{Path, PathBuf};

use crate::decode::BinaryMask;
use crate::error::{ConvertError, Result};

pub const ANCHOR_MARKER: &str = "_anchor";
pub const NANCHOR_MARKER: &str = "_Nanchor";
pub const BINMASK_MARKER: &str = "_binmask";
pub const NBINMASK_MARKER: &str = "_nbinmask";

/// Binary masks are always PNG; a reloaded mask holds only 0 and 255.
pub const BINMASK_EXTENSION: &str = "png";

/// Anchor keeps the class region of the photo, Nanchor keeps everything else.
#[derive(Clone, Debug)]
pub struct ContrastivePair {
    pub anchor: RgbImage,
    pub nanchor: RgbImage,
}

/// Split `raw` along `mask`. Returns `None` when the dimensions differ.
pub fn compose(raw: &RgbImage, mask: &BinaryMask) -> Option<ContrastivePair> {
    if raw.dimensions() != mask.dimensions() {
        return None;
    }
    let (w, h) = raw.dimensions();
    let mut anchor: RgbImage = ImageBuffer::<Rgb<u8>, Vec<u8>>::new(w, h);
    let mut nanchor: RgbImage = ImageBuffer::<Rgb<u8>, Vec<u8>>::new(w, h);
    for ((src, bit), (a, n)) in raw
        .as_raw()
        .chunks_exact(3)
        .zip(mask.bits())
        .zip(anchor.chunks_exact_mut(3).zip(nanchor.chunks_exact_mut(3)))
    {
        if *bit {
            a.copy_from_slice(src);
        } else {
            n.copy_from_slice(src);
        }
    }
    Some(ContrastivePair { anchor, nanchor })
}

/// Output locations for one class of one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairPaths {
    pub anchor: PathBuf,
    pub nanchor: PathBuf,
    /// Binary mask and its complement, when masks are persisted.
    pub binmask: Option<(PathBuf, PathBuf)>,
}

impl PairPaths {
    pub fn new(
        output_dir: &Path,
        binmask_dir: Option<&Path>,
        stem: &str,
        class_index: usize,
        ext: &str,
    ) -> Self {
        let name = |marker: &str, ext: &str| format!("{stem}{marker}{class_index}.{ext}");
        Self {
            anchor: output_dir.join(name(ANCHOR_MARKER, ext)),
            nanchor: output_dir.join(name(NANCHOR_MARKER, ext)),
            binmask: binmask_dir.map(|dir| {
                (
                    dir.join(name(BINMASK_MARKER, BINMASK_EXTENSION)),
                    dir.join(name(NBINMASK_MARKER, BINMASK_EXTENSION)),
                )
            }),
        }
    }

    pub fn pair_exists(&self) -> bool {
        self.anchor.exists() && self.nanchor.exists()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Both anchor and Nanchor were already on disk.
    Skipped,
}

fn save<P>(img: &ImageBuffer<P, Vec<u8>>, path: &Path) -> Result<()>
where
    P: image::PixelWithColorType<Subpixel = u8>,
    [P::Subpixel]: image::EncodableLayout,
{
    img.save(path).map_err(|source| ConvertError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

/// Composite and persist one class. Never touches an existing pair.
pub fn write_pair(raw: &RgbImage, mask: &BinaryMask, paths: &PairPaths) -> Result<WriteOutcome> {
    if paths.pair_exists() {
        debug!("pair {:?} already exists, skipping", paths.anchor);
        return Ok(WriteOutcome::Skipped);
    }
    let pair = compose(raw, mask).ok_or_else(|| ConvertError::DimensionMismatch {
        path: paths.anchor.clone(),
        mask: mask.dimensions(),
        raw: raw.dimensions(),
    })?;
    if let Some((bin, nbin)) = &paths.binmask {
        save(&mask.to_gray(), bin)?;
        save(&mask.inverted().to_gray(), nbin)?;
    }
    save(&pair.anchor, &paths.anchor)?;
    save(&pair.nanchor, &paths.nanchor)?;
    Ok(WriteOutcome::Written)
}
