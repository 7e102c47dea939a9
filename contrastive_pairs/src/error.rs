use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("companion file {companion} for {input} does not exist")]
    MissingCompanion { input: PathBuf, companion: PathBuf },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write image {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path}: label mask is {mask:?} but raw image is {raw:?}")]
    DimensionMismatch {
        path: PathBuf,
        mask: (u32, u32),
        raw: (u32, u32),
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("manifest error: {0}")]
    Manifest(String),
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

impl ConvertError {
    /// Errors that belong to a single input item rather than the whole run.
    /// A missing companion and an undecodable image are handled alike.
    pub fn is_item_failure(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingCompanion { .. }
                | ConvertError::Decode { .. }
                | ConvertError::DimensionMismatch { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
