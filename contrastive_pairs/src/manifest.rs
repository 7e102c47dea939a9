use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::composite::{ANCHOR_MARKER, NANCHOR_MARKER};
use crate::error::{ConvertError, Result};

/// Anchor and Nanchor file names of one dataset output directory. Entry `i`
/// of both lists belongs to the same stem and class index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub subdir: String,
    pub anchors: Vec<String>,
    pub nanchors: Vec<String>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// `subdir/anchor,subdir/nanchor` lines.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.anchors
            .iter()
            .zip(&self.nanchors)
            .map(|(a, n)| format!("{0}/{1},{0}/{2}", self.subdir, a, n))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let f = fs::File::create(path).map_err(|e| ConvertError::io(path, e))?;
        let mut w = BufWriter::new(f);
        for line in self.lines() {
            writeln!(w, "{line}").map_err(|e| ConvertError::io(path, e))?;
        }
        w.flush().map_err(|e| ConvertError::io(path, e))
    }
}

fn counterpart(anchor: &str) -> Option<String> {
    let at = anchor.rfind(ANCHOR_MARKER)?;
    Some(format!(
        "{}{}{}",
        &anchor[..at],
        NANCHOR_MARKER,
        &anchor[at + ANCHOR_MARKER.len()..]
    ))
}

/// Scan `dir` for pair images with extension `ext`. Anchors are sorted and
/// each is matched with the Nanchor of the same stem and class index; an
/// anchor or Nanchor without its counterpart is an error.
pub fn build_manifest(dir: &Path, subdir: &str, ext: &str) -> Result<Manifest> {
    let suffix = format!(".{ext}");
    let mut anchors = Vec::new();
    let mut nanchors = BTreeSet::new();
    for entry in fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))? {
        let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(&suffix) {
            continue;
        }
        if name.contains(NANCHOR_MARKER) {
            nanchors.insert(name);
        } else if name.contains(ANCHOR_MARKER) {
            anchors.push(name);
        }
    }
    anchors.sort();
    if anchors.len() != nanchors.len() {
        return Err(ConvertError::Manifest(format!(
            "{}: {} anchors but {} Nanchors",
            dir.display(),
            anchors.len(),
            nanchors.len()
        )));
    }
    let mut paired = Vec::with_capacity(anchors.len());
    for anchor in &anchors {
        match counterpart(anchor).filter(|n| nanchors.contains(n)) {
            Some(n) => paired.push(n),
            None => {
                return Err(ConvertError::Manifest(format!(
                    "{}: no Nanchor for {}",
                    dir.display(),
                    anchor
                )))
            }
        }
    }
    Ok(Manifest {
        subdir: subdir.to_owned(),
        anchors,
        nanchors: paired,
    })
}
