//! Shared value types for peak extraction.

use crate::defaults;
use crate::error::{PeaksError, Result};
use serde::{Deserialize, Serialize};

/// A (min, max) amplitude pair for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub min: i16,
    pub max: i16,
}

impl Bucket {
    /// Value committed for a bucket that inspected no sample.
    pub const EMPTY: Bucket = Bucket { min: 0, max: 0 };

    pub fn new(min: i16, max: i16) -> Self {
        Self { min, max }
    }

    /// Bucket whose extremes are a single sample.
    pub fn from_sample(value: i16) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Widens the bucket to include `value`.
    pub fn include(&mut self, value: i16) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Combined extremes of two buckets.
    pub fn merge(self, other: Bucket) -> Bucket {
        Bucket {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Parameters fixed for the lifetime of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakConfig {
    /// Interleaved channel count (C).
    pub channels: usize,
    /// Number of buckets per channel (N).
    pub count: usize,
    /// Decimation stride inside a bucket (S).
    pub step: usize,
    /// Return per-channel arrays instead of the merged array when C >= 2.
    pub split: bool,
    /// Seed every bucket with (0, 0) so extremes are always pulled toward zero.
    pub anchor_zero: bool,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            channels: defaults::CHANNELS,
            count: defaults::BUCKET_COUNT,
            step: defaults::STEP,
            split: true,
            anchor_zero: false,
        }
    }
}

impl PeakConfig {
    /// Mono configuration producing `count` buckets.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn with_split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn with_anchor_zero(mut self, anchor_zero: bool) -> Self {
        self.anchor_zero = anchor_zero;
        self
    }

    /// Rejects configurations that cannot drive a stream.
    pub fn validate(&self) -> Result<()> {
        if self.channels < 1 {
            return Err(PeaksError::invalid("channels", "must be at least 1"));
        }
        if self.step < 1 {
            return Err(PeaksError::invalid("step", "must be at least 1"));
        }
        Ok(())
    }

    /// Whether [`Peaks::Split`] is produced for this configuration.
    pub fn splits(&self) -> bool {
        self.split && self.channels >= 2
    }

    /// Per-channel sample count for a raw stream of `byte_len` bytes.
    ///
    /// Trailing bytes that do not form a whole frame are not counted.
    pub fn total_samples(&self, byte_len: u64) -> u64 {
        byte_len / defaults::SAMPLE_WIDTH / self.channels.max(1) as u64
    }
}

/// Finished peak data in its external layout.
///
/// Each array is flat: `[min0, max0, min1, max1, ...]`, two entries per bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Peaks {
    /// Cross-channel extremes.
    Merged(Vec<i16>),
    /// One flat array per channel.
    Split(Vec<Vec<i16>>),
}

impl Peaks {
    /// Number of buckets per array.
    pub fn bucket_count(&self) -> usize {
        match self {
            Peaks::Merged(flat) => flat.len() / 2,
            Peaks::Split(channels) => channels.first().map_or(0, |flat| flat.len() / 2),
        }
    }

    /// Number of arrays: 1 when merged.
    pub fn channel_count(&self) -> usize {
        match self {
            Peaks::Merged(_) => 1,
            Peaks::Split(channels) => channels.len(),
        }
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Flattens buckets into `[min, max, ...]`, padding to `count` with zeros.
pub(crate) fn flatten<I>(buckets: I, count: usize) -> Vec<i16>
where
    I: IntoIterator<Item = Bucket>,
{
    let mut flat = Vec::with_capacity(count * 2);
    for bucket in buckets.into_iter().take(count) {
        flat.push(bucket.min);
        flat.push(bucket.max);
    }
    flat.resize(count * 2, 0);
    flat
}
