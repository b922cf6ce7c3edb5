//! Streaming waveform peak extraction.
//!
//! ```text
//! ┌────────────┐  bytes  ┌──────────────┐  per-channel  ┌───────────────────┐
//! │ ByteSource │────────▶│ ChunkDecoder │──────────────▶│ BucketAccumulator │──▶ Peaks
//! └────────────┘         └──────────────┘    samples    └───────────────────┘
//!        ▲                      │                              │
//!        └──── PeakFinder ──────┴──────── drives ──────────────┘
//! ```
//!
//! Input is raw interleaved 16-bit signed little-endian PCM of known total
//! length, delivered in chunks of any size. Output is a fixed number of
//! (min, max) buckets per channel, or merged across channels.

pub mod accumulator;
pub mod decoder;
pub mod finder;
pub mod types;

pub use accumulator::BucketAccumulator;
pub use decoder::{ChannelBatch, ChunkDecoder};
pub use finder::{PeakFinder, Progress, extract_peaks, get_peaks, write_peaks};
pub use types::{Bucket, PeakConfig, Peaks};
