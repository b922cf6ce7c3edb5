//! Incremental min/max bucketing over streamed sample batches.
//!
//! Bucket `i` of a channel covers samples `[floor(i*T/N), floor((i+1)*T/N))`
//! where `T` is the per-channel sample count and `N` the bucket count. Batches
//! arrive in stream order and may end anywhere, including mid-bucket. When a
//! batch runs out the channel records where it stopped and resumes there on
//! the next call, so the result does not depend on how the stream was cut.

use crate::error::Result;
use crate::peaks::types::{Bucket, PeakConfig, Peaks, flatten};

/// First sample index of bucket `index`. `count` must be non-zero.
fn boundary(index: usize, total_samples: u64, count: usize) -> u64 {
    (index as u128 * total_samples as u128 / count as u128) as u64
}

/// Resumption state of one channel.
#[derive(Debug, Clone)]
struct ChannelState {
    /// Bucket in progress; equals the bucket count once the channel is done.
    bucket: usize,
    /// Stream sample index at which the walk resumes.
    cursor: u64,
    /// Samples of this channel delivered by earlier batches.
    received: u64,
    /// Extremes of the bucket in progress.
    running: Option<Bucket>,
}

/// Owns the bucket arrays for one extraction.
#[derive(Debug, Clone)]
pub struct BucketAccumulator {
    count: usize,
    step: u64,
    total_samples: u64,
    split: bool,
    /// Running state every bucket starts from.
    seed: Option<Bucket>,
    channels: Vec<ChannelState>,
    committed: Vec<Vec<Bucket>>,
    merged: Vec<Option<Bucket>>,
}

impl BucketAccumulator {
    pub fn new(config: &PeakConfig, total_samples: u64) -> Result<Self> {
        config.validate()?;

        let seed = config.anchor_zero.then_some(Bucket::EMPTY);
        let state = ChannelState {
            bucket: 0,
            cursor: 0,
            received: 0,
            running: seed,
        };

        Ok(Self {
            count: config.count,
            step: config.step as u64,
            total_samples,
            split: config.splits(),
            seed,
            channels: vec![state; config.channels],
            committed: (0..config.channels)
                .map(|_| Vec::with_capacity(config.count))
                .collect(),
            merged: vec![None; config.count],
        })
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn bucket_count(&self) -> usize {
        self.count
    }

    /// Buckets committed by every channel.
    pub fn completed(&self) -> usize {
        self.channels
            .iter()
            .map(|state| state.bucket)
            .min()
            .unwrap_or(0)
    }

    /// Whether every channel has committed all of its buckets.
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.count
    }

    /// Buckets committed so far for `channel`.
    pub fn channel_buckets(&self, channel: usize) -> &[Bucket] {
        self.committed.get(channel).map_or(&[], |b| b.as_slice())
    }

    /// Merged value at `index`, if any channel has committed it.
    pub fn merged_bucket(&self, index: usize) -> Option<Bucket> {
        self.merged.get(index).copied().flatten()
    }

    /// Consumes the next batch of samples, one slice per channel.
    ///
    /// Missing channels are treated as empty; extra channels are ignored.
    pub fn update<S: AsRef<[i16]>>(&mut self, batch: &[S]) {
        for channel in 0..self.channels.len() {
            let samples = batch.get(channel).map_or(&[][..], |s| s.as_ref());
            self.update_channel(channel, samples);
        }
    }

    fn update_channel(&mut self, channel: usize, samples: &[i16]) {
        let len = samples.len() as u64;
        let state = &mut self.channels[channel];

        while state.bucket < self.count {
            let index = state.bucket;
            let end = boundary(index + 1, self.total_samples, self.count);
            let mut running = state.running;
            let mut j = boundary(index, self.total_samples, self.count).max(state.cursor);

            while j < end {
                debug_assert!(j >= state.received);
                let local = j - state.received;
                if local >= len {
                    state.cursor = j;
                    state.running = running;
                    state.received += len;
                    return;
                }

                let value = samples[local as usize];
                running = Some(match running {
                    Some(mut bucket) => {
                        bucket.include(value);
                        bucket
                    }
                    None => Bucket::from_sample(value),
                });
                j += self.step;
            }

            let bucket = running.unwrap_or(Bucket::EMPTY);
            self.committed[channel].push(bucket);
            let slot = &mut self.merged[index];
            *slot = Some(slot.map_or(bucket, |m| m.merge(bucket)));

            state.running = self.seed;
            state.bucket += 1;
        }

        state.received += len;
    }

    /// Snapshot of the peaks in their external layout.
    ///
    /// Buckets not yet committed read as zero. Calling this repeatedly without
    /// an intervening [`update`](Self::update) returns identical data.
    pub fn get(&self) -> Peaks {
        if self.split {
            Peaks::Split(
                self.committed
                    .iter()
                    .map(|buckets| flatten(buckets.iter().copied(), self.count))
                    .collect(),
            )
        } else {
            Peaks::Merged(flatten(
                self.merged.iter().map(|b| b.unwrap_or(Bucket::EMPTY)),
                self.count,
            ))
        }
    }
}
