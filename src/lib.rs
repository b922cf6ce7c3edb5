//! wavepeaks - Streaming waveform peak extraction
//!
//! Computes per-channel (min, max) amplitude buckets from raw 16-bit PCM
//! delivered in arbitrarily sized chunks, and bridges the result into a media
//! pipeline job.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod peaks;
pub mod pipeline;
pub mod source;

// Core traits (source → decode → accumulate)
pub use source::{ByteSource, MemorySource, MockByteSource, ReaderSource};

// Peak extraction
pub use peaks::{
    Bucket, BucketAccumulator, ChannelBatch, ChunkDecoder, PeakConfig, PeakFinder, Peaks,
    Progress, extract_peaks, get_peaks, write_peaks,
};

// Pipeline boundary
pub use pipeline::{Job, TranscodeRequest, peaks_intermediary};

// Error handling
pub use error::{PeaksError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
