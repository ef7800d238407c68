//! Pseudo-uniform sampling of crop parameters.
//!
//! A parameter range is split into equally sized bins. Every draw picks one
//! of the least used bins inside the allowed window, so over a training run
//! the sampled values cover the range evenly even when the allowed window
//! changes from image to image.

use rand::Rng;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SamplerError {
    #[error("Bin range needs at least one bin")]
    NoBins,
    #[error("Invalid bin range: min {min} must be finite and below max {max}")]
    InvalidBounds { min: f64, max: f64 },
}

/// `bins` equally sized bins covering `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinRange {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
}

impl BinRange {
    /// Vertical field of view in degrees.
    pub const VFOV: BinRange = BinRange {
        min: 20.0,
        max: 100.0,
        bins: 81,
    };

    /// Focal length relative to the image height.
    pub const RELATIVE_FOCAL: BinRange = BinRange {
        min: 0.5,
        max: 2.0,
        bins: 61,
    };

    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        BinRange { min, max, bins }
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.bins == 0 {
            return Err(SamplerError::NoBins);
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(SamplerError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn bin_size(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Bin id of `value`: the number of inner boundaries strictly below it.
    ///
    /// A value lying exactly on a boundary belongs to the lower bin. Values
    /// outside the range saturate to the first or last bin.
    pub fn encode(&self, value: f64) -> usize {
        let size = self.bin_size();
        (1..self.bins)
            .filter(|&k| self.min + size * (k as f64) < value)
            .count()
    }

    /// Centre of bin `bin`.
    pub fn decode(&self, bin: usize) -> f64 {
        self.min + self.bin_size() * (bin as f64 + 0.5)
    }
}

/// Per-bin usage counter for one [`BinRange`].
///
/// Each training run owns its own sampler; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct BinSampler {
    range: BinRange,
    counts: Vec<u64>,
}

impl BinSampler {
    pub fn new(range: BinRange) -> Result<Self, SamplerError> {
        range.validate()?;
        Ok(BinSampler {
            range,
            counts: vec![0; range.bins],
        })
    }

    pub fn range(&self) -> &BinRange {
        &self.range
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    fn draw<R: Rng + ?Sized>(&mut self, first: usize, last: usize, rng: &mut R) -> f64 {
        let window = &self.counts[first..=last];
        let least = window.iter().copied().min().unwrap_or(0);
        let candidates = window
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == least)
            .map(|(offset, _)| first + offset)
            .collect::<Vec<_>>();

        let bin = candidates[rng.random_range(0..candidates.len())];
        self.counts[bin] += 1;

        let half = self.range.bin_size() / 2.0;
        self.range.decode(bin) + rng.random_range(-half..half)
    }

    /// Draws a value no larger than `max`, preferring the least used bins
    /// between the first bin and the bin of `max`.
    pub fn sample_at_most<R: Rng + ?Sized>(&mut self, max: f64, rng: &mut R) -> f64 {
        let last = self.range.encode(max);
        self.draw(0, last, rng).min(max)
    }

    /// Draws a value no smaller than `min`, preferring the least used bins
    /// between the bin of `min` and the last bin.
    pub fn sample_at_least<R: Rng + ?Sized>(&mut self, min: f64, rng: &mut R) -> f64 {
        let first = self.range.encode(min);
        self.draw(first, self.range.bins - 1, rng).max(min)
    }
}
