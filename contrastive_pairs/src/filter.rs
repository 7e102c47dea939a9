use crate::decode::BinaryMask;
use crate::error::{ConvertError, Result};

/// Minimum share of the image a class region must exceed to become a pair.
pub const DEFAULT_MIN_FRACTION: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaFilter {
    min_fraction: f64,
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            min_fraction: DEFAULT_MIN_FRACTION,
        }
    }
}

impl AreaFilter {
    pub fn new(min_fraction: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&min_fraction) {
            return Err(ConvertError::Config(format!(
                "area threshold must be in [0, 1), got {min_fraction}"
            )));
        }
        Ok(Self { min_fraction })
    }

    /// Rejects empty regions and regions covering at most `min_fraction` of
    /// `total` pixels.
    pub fn accepts_count(&self, count: usize, total: usize) -> bool {
        count != 0 && count as f64 > self.min_fraction * total as f64
    }

    pub fn accepts(&self, mask: &BinaryMask) -> bool {
        self.accepts_count(mask.count(), mask.area())
    }
}
