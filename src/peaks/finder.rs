//! Stream driver binding a byte source to the decoder and accumulator.

use crate::error::{PeaksError, Result};
use crate::peaks::accumulator::BucketAccumulator;
use crate::peaks::decoder::{ChannelBatch, ChunkDecoder};
use crate::peaks::types::{PeakConfig, Peaks};
use crate::source::{ByteSource, ReaderSource};
use std::path::Path;
use tracing::debug;

/// Outcome of feeding one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More input is needed; `completed` buckets are final on every channel.
    Suspended { completed: usize },
    /// Every bucket of every channel is committed. Further input is ignored.
    Done,
}

/// Incremental peak extraction over one raw PCM stream.
///
/// Created with the stream's total byte length, fed chunks in order with
/// [`feed`](Self::feed), and consumed by [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct PeakFinder {
    decoder: ChunkDecoder,
    accumulator: BucketAccumulator,
    batch: ChannelBatch,
    bytes_fed: u64,
    chunks_fed: u64,
}

impl PeakFinder {
    /// Fails on invalid configuration before any input is read.
    pub fn new(config: &PeakConfig, total_bytes: u64) -> Result<Self> {
        config.validate()?;
        let total_samples = config.total_samples(total_bytes);
        Ok(Self {
            decoder: ChunkDecoder::new(config.channels),
            accumulator: BucketAccumulator::new(config, total_samples)?,
            batch: ChannelBatch::new(config.channels),
            bytes_fed: 0,
            chunks_fed: 0,
        })
    }

    /// Per-channel sample count derived from the byte length.
    pub fn total_samples(&self) -> u64 {
        self.accumulator.total_samples()
    }

    pub fn bytes_fed(&self) -> u64 {
        self.bytes_fed
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Progress {
        self.bytes_fed += chunk.len() as u64;
        self.chunks_fed += 1;

        self.decoder.decode_into(chunk, &mut self.batch);
        self.accumulator.update(self.batch.channels());

        if self.accumulator.is_complete() {
            Progress::Done
        } else {
            Progress::Suspended {
                completed: self.accumulator.completed(),
            }
        }
    }

    /// Snapshot without ending the stream.
    pub fn peek(&self) -> Peaks {
        self.accumulator.get()
    }

    /// Ends the stream and returns the peaks.
    pub fn finish(self) -> Peaks {
        debug!(
            chunks = self.chunks_fed,
            bytes = self.bytes_fed,
            completed = self.accumulator.completed(),
            buckets = self.accumulator.bucket_count(),
            "peak stream finished"
        );
        self.accumulator.get()
    }

    /// Drains `source` to end of stream.
    ///
    /// A source error aborts the run; the finder is dropped with it so no
    /// partial peaks escape.
    pub async fn run<S: ByteSource + ?Sized>(mut self, source: &mut S) -> Result<Peaks> {
        while let Some(chunk) = source.next_chunk().await? {
            self.feed(&chunk);
        }
        Ok(self.finish())
    }
}

/// Extracts peaks from a raw PCM file, reading `chunk_size` bytes at a time.
pub async fn extract_peaks(path: &Path, config: &PeakConfig, chunk_size: usize) -> Result<Peaks> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| PeaksError::Stream {
            message: format!("failed to stat {}: {}", path.display(), e),
        })?;

    let finder = PeakFinder::new(config, metadata.len())?;
    debug!(
        path = %path.display(),
        bytes = metadata.len(),
        total_samples = finder.total_samples(),
        channels = config.channels,
        buckets = config.count,
        step = config.step,
        "extracting peaks"
    );

    let mut source = ReaderSource::open(path, chunk_size).await?;
    finder.run(&mut source).await
}

/// Persists peaks as a JSON array.
pub async fn write_peaks(path: &Path, peaks: &Peaks) -> Result<()> {
    let json = peaks.to_json()?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| PeaksError::PeaksWrite {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Extracts peaks and, when `output` is given, writes them there as JSON.
pub async fn get_peaks(
    path: &Path,
    config: &PeakConfig,
    chunk_size: usize,
    output: Option<&Path>,
) -> Result<Peaks> {
    let peaks = extract_peaks(path, config, chunk_size).await?;
    if let Some(output) = output {
        write_peaks(output, &peaks).await?;
        debug!(output = %output.display(), "peaks written");
    }
    Ok(peaks)
}
