use serde::Serialize;

use crate::curve::Curve;

/// Number of samples in the exposure lookup table uploaded to shaders.
pub const ADJUSTMENT_CURVE_PRECISION: usize = 128;

/// Fixed-size lookup table sampled uniformly between the first and last key of a curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleTable {
    samples: Vec<f32>,
    min_time: f32,
    max_time: f32,
}

impl SampleTable {
    /// All-zero table of `len` samples with a `0..0` time range.
    pub fn zeroed(len: usize) -> Self {
        Self {
            samples: vec![0.0; len.max(1)],
            min_time: 0.0,
            max_time: 0.0,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn min_time(&self) -> f32 {
        self.min_time
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Overwrites the table in place from `curve`, keeping its length.
    ///
    /// An empty curve yields all zeros and a `0..0` range rather than an error.
    pub fn resample_into<C: Curve + ?Sized>(&mut self, curve: &C) {
        let Some((min_time, max_time)) = curve.time_range() else {
            self.samples.fill(0.0);
            self.min_time = 0.0;
            self.max_time = 0.0;
            return;
        };

        let count = self.samples.len();
        let step = if count > 1 {
            (max_time - min_time) / (count - 1) as f32
        } else {
            0.0
        };
        for (index, slot) in self.samples.iter_mut().enumerate() {
            *slot = curve.evaluate(min_time + step * index as f32);
        }
        self.min_time = min_time;
        self.max_time = max_time;
    }
}

impl Default for SampleTable {
    fn default() -> Self {
        Self::zeroed(ADJUSTMENT_CURVE_PRECISION)
    }
}

/// Samples `curve` at `count` evenly spaced times spanning its key range.
///
/// `count == 0` is treated as a single sample.
pub fn resample<C: Curve + ?Sized>(curve: &C, count: usize) -> SampleTable {
    let mut table = SampleTable::zeroed(count);
    table.resample_into(curve);
    table
}
