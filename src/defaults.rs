//! Default configuration constants for wavepeaks.
//!
//! Shared between the config file layer, the CLI and the pipeline adapter so
//! the three agree on what an unspecified value means.

/// Bytes per PCM sample (16-bit signed little-endian).
pub const SAMPLE_WIDTH: u64 = 2;

/// Default number of peak buckets when a request does not specify one.
pub const BUCKET_COUNT: usize = 600;

/// Default decimation step. 1 inspects every sample.
pub const STEP: usize = 1;

/// Default channel count for raw input.
pub const CHANNELS: usize = 1;

/// Default intermediary quality factor.
///
/// The intermediary sample rate scales with the square of quality, so 0.5
/// yields a quarter of [`BASE_SAMPLE_RATE`].
pub const QUALITY: f64 = 0.5;

/// Lowest accepted quality factor.
pub const MIN_QUALITY: f64 = 0.1;

/// Highest accepted quality factor.
pub const MAX_QUALITY: f64 = 1.0;

/// Sample rate of a quality 1.0 intermediary, in Hz.
pub const BASE_SAMPLE_RATE: u32 = 44100;

/// Raw PCM format name understood by the external transcoder.
pub const INTERMEDIARY_FORMAT: &str = "s16le";

/// Default read size for file-backed byte sources (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;
